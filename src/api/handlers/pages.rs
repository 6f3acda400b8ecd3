//! Placeholder page shells. The dashboards themselves live in the front end;
//! the server only has to deliver something once the edge guard lets a request
//! through.

use crate::guard::policy::normalize;
use axum::{
    http::{StatusCode, Uri},
    response::{Html, IntoResponse, Response},
};

fn title(path: &str) -> Option<&'static str> {
    let section = path.split('/').nth(1).unwrap_or_default();
    match (path, section) {
        ("/", _) => Some("Inicio"),
        ("/login", _) => Some("Iniciar sesión"),
        ("/registro", _) => Some("Registro"),
        (_, "cliente") => Some("Portal de clientes"),
        (_, "admin") => Some("Panel de administración"),
        _ => None,
    }
}

pub async fn page(uri: Uri) -> Response {
    let path = normalize(uri.path());
    match title(path) {
        Some(title) => Html(format!(
            "<!doctype html><html lang=\"es\"><head><meta charset=\"utf-8\"><title>{title} | Electrocentro</title></head><body><main id=\"app\"></main></body></html>"
        ))
        .into_response(),
        None => (StatusCode::NOT_FOUND, Html("<h1>Página no encontrada</h1>")).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn titles_by_section() {
        assert_eq!(title("/"), Some("Inicio"));
        assert_eq!(title("/cliente/bienvenida"), Some("Portal de clientes"));
        assert_eq!(title("/admin"), Some("Panel de administración"));
        assert_eq!(title("/administrar"), None);
    }
}
