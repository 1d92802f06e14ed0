//! Documentation pages and the payload embedded in them.
//!
//! Upstream documentation is served as HTML with the page content embedded as a
//! single JSON blob in an attribute of one element (by default
//! `data-initial-props`). The blob carries the raw markup body and, for
//! endpoint reference pages, a description of the HTTP endpoint:
//!
//! ```json
//! {"doc": {"title": "Retrieve a user", "body": "...",
//!          "api": {"method": "get", "url": "/v1/users/{user_id}",
//!                  "params": [{"name": "user_id", "in": "path", "type": "string",
//!                              "required": true, "desc": "...", "example": ""}]}}}
//! ```
//!
//! Unknown fields anywhere in the blob are ignored; only the markup body is
//! validated strictly (by the [tokenizer](crate::tokenize)).

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::errors::TokenizeError;

/// Attribute that carries the page payload unless configured otherwise.
pub const DEFAULT_PAYLOAD_ATTRIBUTE: &str = "data-initial-props";

/// HTTP methods an endpoint page can describe.
///
/// ## Examples
///
/// ```
/// use std::str::FromStr;
/// use docdrift_lib::page::RestMethod;
///
/// assert_eq!(RestMethod::from_str("patch").unwrap(), RestMethod::Patch);
/// assert_eq!(RestMethod::Patch.to_string(), "PATCH");
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum RestMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

/// Where an endpoint parameter travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Body,
    Header,
}

/// One parameter of an endpoint description.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EndpointParameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    #[serde(rename = "type", default)]
    pub ty: String,
    #[serde(default)]
    pub required: bool,
    #[serde(rename = "desc", default)]
    pub description: String,
    #[serde(default)]
    pub example: String,
}

impl EndpointParameter {
    pub fn new(
        name: impl Into<String>,
        location: ParameterLocation,
        ty: impl Into<String>,
        required: bool,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            location,
            ty: ty.into(),
            required,
            description: description.into(),
            example: String::new(),
        }
    }

    pub fn with_example(mut self, example: impl Into<String>) -> Self {
        self.example = example.into();
        self
    }
}

/// The endpoint an API reference page documents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub method: RestMethod,
    pub url: String,
    #[serde(rename = "params", default)]
    pub parameters: Vec<EndpointParameter>,
}

impl Endpoint {
    pub fn new(method: RestMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            parameters: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, parameter: EndpointParameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Placeholder names in the URL template, in order.
    pub fn path_params(&self) -> Vec<&str> {
        extract_path_params(&self.url)
    }

    /// Returns the first URL placeholder that no path parameter declares.
    pub fn undeclared_path_parameter(&self) -> Option<&str> {
        self.path_params().into_iter().find(|placeholder| {
            !self
                .parameters
                .iter()
                .any(|p| p.location == ParameterLocation::Path && p.name == *placeholder)
        })
    }
}

/// A retrieved documentation page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub title: String,
    pub body: String,
    #[serde(rename = "api", default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<Endpoint>,
}

#[derive(Deserialize, Serialize)]
struct Payload {
    doc: Page,
}

impl Page {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            endpoint: None,
        }
    }

    pub fn with_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    /// Extracts the page payload from the HTML of a documentation page.
    ///
    /// ## Errors
    ///
    /// - [`TokenizeError::MissingPayload`] if no element carries `attribute`
    /// - [`TokenizeError::MalformedPayload`] if the attribute is not the expected JSON
    ///
    /// ## Examples
    ///
    /// ```
    /// use docdrift_lib::page::{Page, DEFAULT_PAYLOAD_ATTRIBUTE};
    ///
    /// let html = r#"<div id="ssr-props" data-initial-props="{&quot;doc&quot;: {&quot;body&quot;: &quot;Hello.&quot;}}"></div>"#;
    /// let page = Page::from_html(html, DEFAULT_PAYLOAD_ATTRIBUTE).unwrap();
    /// assert_eq!(page.body, "Hello.");
    /// assert!(page.endpoint.is_none());
    /// ```
    pub fn from_html(html: &str, attribute: &str) -> Result<Self, TokenizeError> {
        let missing = || TokenizeError::MissingPayload {
            attribute: attribute.to_string(),
        };

        let selector = Selector::parse(&format!("[{attribute}]")).map_err(|_| missing())?;
        let document = Html::parse_document(html);
        let raw = document
            .select(&selector)
            .find_map(|element| element.value().attr(attribute))
            .ok_or_else(missing)?;

        let payload: Payload =
            serde_json::from_str(raw).map_err(TokenizeError::MalformedPayload)?;
        Ok(payload.doc)
    }

    /// Renders a minimal HTML page embedding this page as its payload.
    ///
    /// The inverse of [`Page::from_html`]; used to serve pages offline.
    pub fn to_html(&self, attribute: &str) -> String {
        let payload = Payload { doc: self.clone() };
        // Serializing plain strings and enums cannot fail.
        let json = serde_json::to_string(&payload).unwrap_or_default();
        format!(
            "<!DOCTYPE html>\n<html><head><title>{}</title></head><body><div id=\"ssr-props\" {}=\"{}\"></div></body></html>\n",
            escape_html(&self.title),
            attribute,
            escape_html(&json)
        )
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Extracts parameter names from a path template.
///
/// ## Examples
///
/// ```
/// use docdrift_lib::page::extract_path_params;
///
/// assert_eq!(extract_path_params("/v1/users"), Vec::<&str>::new());
/// assert_eq!(
///     extract_path_params("/v1/blocks/{block_id}/children"),
///     vec!["block_id"]
/// );
/// ```
pub fn extract_path_params(path: &str) -> Vec<&str> {
    let mut params = Vec::new();
    let mut start = None;

    for (idx, c) in path.char_indices() {
        match c {
            '{' => start = Some(idx + 1),
            '}' => {
                if let Some(from) = start.take() {
                    let param = &path[from..idx];
                    if !param.is_empty() {
                        params.push(param);
                    }
                }
            }
            _ => {}
        }
    }

    params
}

#[cfg(test)]
mod tests {
    use super::*;

    fn retrieve_user() -> Endpoint {
        Endpoint::new(RestMethod::Get, "/v1/users/{user_id}").with_parameter(
            EndpointParameter::new(
                "user_id",
                ParameterLocation::Path,
                "string",
                true,
                "Identifier for a Notion user",
            ),
        )
    }

    #[test]
    fn extract_multiple_params() {
        assert_eq!(
            extract_path_params("/v1/pages/{page_id}/properties/{property_id}"),
            vec!["page_id", "property_id"]
        );
        assert_eq!(extract_path_params("/{a}/{b}"), vec!["a", "b"]);
    }

    #[test]
    fn extract_ignores_unbalanced_braces() {
        assert_eq!(extract_path_params("/v1/{}/x}"), Vec::<&str>::new());
    }

    #[test]
    fn declared_path_parameters_pass() {
        assert_eq!(retrieve_user().undeclared_path_parameter(), None);
    }

    #[test]
    fn undeclared_path_parameter_is_reported() {
        let endpoint = Endpoint::new(RestMethod::Get, "/v1/users/{user_id}");
        assert_eq!(endpoint.undeclared_path_parameter(), Some("user_id"));

        // a body parameter with the same name does not count
        let endpoint = endpoint.with_parameter(EndpointParameter::new(
            "user_id",
            ParameterLocation::Body,
            "string",
            true,
            "",
        ));
        assert_eq!(endpoint.undeclared_path_parameter(), Some("user_id"));
    }

    #[test]
    fn html_round_trip_preserves_page() {
        let page = Page::new("Retrieve a user", "Retrieves a \"User\" & <more>.")
            .with_endpoint(retrieve_user());
        let html = page.to_html(DEFAULT_PAYLOAD_ATTRIBUTE);
        assert_eq!(Page::from_html(&html, DEFAULT_PAYLOAD_ATTRIBUTE).unwrap(), page);
    }

    #[test]
    fn unknown_payload_fields_are_tolerated() {
        let html = r#"<div data-initial-props='{"version": 3, "doc": {"body": "x", "slug": "user", "api": {"method": "post", "url": "/v1/pages", "auth": "required", "params": [{"name": "parent", "in": "body", "type": "object", "required": true, "_id": "1"}]}}}'></div>"#;
        let page = Page::from_html(html, DEFAULT_PAYLOAD_ATTRIBUTE).unwrap();
        let endpoint = page.endpoint.unwrap();
        assert_eq!(endpoint.method, RestMethod::Post);
        assert_eq!(endpoint.parameters[0].location, ParameterLocation::Body);
        assert_eq!(endpoint.parameters[0].description, "");
    }

    #[test]
    fn missing_payload_attribute_is_a_grammar_fault() {
        let err = Page::from_html("<html><body></body></html>", "data-props").unwrap_err();
        assert!(matches!(err, TokenizeError::MissingPayload { ref attribute } if attribute == "data-props"));
    }

    #[test]
    fn malformed_payload_is_a_grammar_fault() {
        let html = r#"<div data-initial-props="{not json"></div>"#;
        let err = Page::from_html(html, DEFAULT_PAYLOAD_ATTRIBUTE).unwrap_err();
        assert!(matches!(err, TokenizeError::MalformedPayload(_)));
    }

    #[test]
    fn method_display_and_parse() {
        use std::str::FromStr;
        assert_eq!(RestMethod::Delete.to_string(), "DELETE");
        assert_eq!(RestMethod::from_str("GET").unwrap(), RestMethod::Get);
        assert!(RestMethod::from_str("TRACE").is_err());
    }
}
