//! GET /sitemap.xml - static pages plus one URL per listing.

use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::entities::{ApiEntity, Condominium, Project, Property};
use crate::error::ApiError;
use crate::state::AppState;
use crate::storage::Filter;

const STATIC_PATHS: &[&str] = &["", "/properties", "/projects", "/condominiums", "/about"];

fn url_entry(out: &mut String, loc: &str) {
    out.push_str("  <url><loc>");
    out.push_str(loc);
    out.push_str("</loc></url>\n");
}

pub async fn sitemap(State(state): State<AppState>) -> Result<Response, ApiError> {
    let base = state.config.http.base_url.trim_end_matches('/');

    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n");

    for path in STATIC_PATHS {
        url_entry(&mut xml, &format!("{}{}", base, path));
    }
    for property in state.storage.list::<Property>(&Filter::new()).await? {
        url_entry(&mut xml, &format!("{}/properties/{}", base, property.id()));
    }
    for project in state.storage.list::<Project>(&Filter::new()).await? {
        url_entry(&mut xml, &format!("{}/projects/{}", base, project.id()));
    }
    for condo in state.storage.list::<Condominium>(&Filter::new()).await? {
        url_entry(&mut xml, &format!("{}/condominiums/{}", base, condo.id()));
    }

    xml.push_str("</urlset>\n");
    Ok(([(header::CONTENT_TYPE, "application/xml")], xml).into_response())
}
