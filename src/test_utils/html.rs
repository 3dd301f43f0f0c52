use axum::{body::Body, response::Response};
use scraper::{Html, Selector};

use crate::test_utils::http::read_body;

pub(crate) async fn parse_html_document(response: Response<Body>) -> Html {
    let body = read_body(response).await;
    Html::parse_document(&String::from_utf8_lossy(&body))
}

/// Parse a partial page, e.g. an HTMX swap.
pub(crate) async fn parse_html_fragment(response: Response<Body>) -> Html {
    let body = read_body(response).await;
    Html::parse_fragment(&String::from_utf8_lossy(&body))
}

#[track_caller]
pub(crate) fn assert_valid_html(html: &Html) {
    assert!(
        html.errors.is_empty(),
        "Got HTML parsing errors: {:?}",
        html.errors
    );
}

/// The trimmed text of every element matching `selector`, in document order.
pub(crate) fn texts_of(html: &Html, selector: &str) -> Vec<String> {
    let selector = Selector::parse(selector).unwrap();

    html.select(&selector)
        .map(|element| element.text().collect::<String>().trim().to_owned())
        .collect()
}
