use axum::{
    body::Body,
    http::{StatusCode, header::CONTENT_TYPE},
    response::Response,
};
use scraper::Html;

use super::{assert_valid_html, parse_html_fragment};

#[track_caller]
pub(crate) fn get_header(response: &Response<Body>, header_name: &str) -> String {
    let header_error_message = format!("Headers missing {header_name}");

    response
        .headers()
        .get(header_name)
        .expect(&header_error_message)
        .to_str()
        .expect("Could not convert to str")
        .to_string()
}

#[track_caller]
pub(crate) fn assert_hx_redirect(response: &Response<Body>, endpoint: &str) {
    assert_eq!(get_header(response, "hx-redirect"), endpoint);
}

/// Check that `response` is an HTML alert with `want_status`, and return the alert.
pub(crate) async fn must_get_alert(response: Response<Body>, want_status: StatusCode) -> Html {
    assert_eq!(response.status(), want_status);
    assert_eq!(
        get_header(&response, CONTENT_TYPE.as_str()),
        "text/html; charset=utf-8"
    );

    let html = parse_html_fragment(response).await;
    assert_valid_html(&html);

    html
}
