//! `GET /v1/users/{user_id}`.

use docdrift_lib::compare::Comparator;
use docdrift_lib::element::{Block, Parameter};
use docdrift_lib::errors::DriftError;
use docdrift_lib::page::{Endpoint, EndpointParameter, Page, ParameterLocation, RestMethod};
use docdrift_lib::pipeline::Conversion;
use docdrift_lib::schema::{DocumentBuilder, SymbolRef, TypeRef};

pub const URL: &str = "/reference/get-user";

const BODY: &str = include_str!("../../fixtures/retrieve_user.md");

fn endpoint() -> Endpoint {
    Endpoint::new(RestMethod::Get, "/v1/users/{user_id}").with_parameter(EndpointParameter::new(
        "user_id",
        ParameterLocation::Path,
        "string",
        true,
        "Identifier for a Notion user",
    ))
}

pub fn recorded_page() -> Page {
    Page::new("Retrieve a user", BODY).with_endpoint(endpoint())
}

pub struct RetrieveUser;

impl Conversion for RetrieveUser {
    fn name(&self) -> &str {
        "retrieve_user"
    }

    fn url(&self) -> &str {
        URL
    }

    /// The response check decodes into `User`.
    fn requires(&self) -> &[&str] {
        &["user"]
    }

    fn expect(&self, c: &mut Comparator<'_, DocumentBuilder>) -> Result<(), DriftError> {
        c.expect_endpoint(endpoint())?.output(|endpoint, b| {
            let params = b.add_record(
                "RetrieveUserParams",
                &format!("Path parameters of `{} {}`.", endpoint.method, endpoint.url),
            )?;
            for parameter in &endpoint.parameters {
                let row = Parameter::new(
                    parameter.name.as_str(),
                    parameter.ty.as_str(),
                    parameter.description.as_str(),
                    parameter.example.as_str(),
                );
                b.add_field(&params, &row, TypeRef::String, &[])?;
            }
            Ok(())
        });

        c.expect_block(Block::paragraph("Retrieves a User using the ID specified."))?;
        c.expect_block(Block::blockquote(
            "Errors\nReturns a 404 HTTP response if the user doesn't exist, or if the integration doesn't have access to the user.",
        ))?;

        // The response is a full user object; the page only links to it.
        c.undocumented(|b| {
            b.add_unmarshal_check(
                &SymbolRef::global("User"),
                r#"{"object": "user", "id": "9a3b5ae0-c6e6-482d-b0e1-ed315ee6dc57", "type": "bot", "bot": {}}"#,
                None,
            );
            Ok(())
        });

        Ok(())
    }
}
