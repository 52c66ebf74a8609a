use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::{json, Map, Value};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{errors, models, routes};

#[derive(OpenApi)]
#[openapi(
	paths(
		routes::health::health,
		routes::auth::login,
		routes::auth::me,
		routes::users::list_users,
		routes::users::get_user,
		routes::users::create_user,
		routes::users::update_user,
		routes::users::delete_user
	),
	components(
		schemas(
			models::user::User,
			models::user::UserCreateRequest,
			models::user::UserUpdateRequest,
			models::user::LoginRequest,
			models::user::Session,
			models::envelope::UsersResponse,
			models::envelope::SessionResponse,
			errors::ErrorResponse,
			routes::health::HealthResponse
		)
	),
	tags(
		(name = "Auth", description = "Authentication endpoints"),
		(name = "Users", description = "User management, gated by role permissions"),
		(name = "Health", description = "Liveness and database checks")
	)
)]
pub struct ApiDoc;

pub fn build_openapi(port: u16) -> anyhow::Result<utoipa::openapi::OpenApi> {
	let mut doc = serde_json::to_value(ApiDoc::openapi())?;

	ensure_security_components(&mut doc)?;
	ensure_servers(&mut doc, port)?;

	Ok(serde_json::from_value(doc)?)
}

pub fn swagger_routes(doc: utoipa::openapi::OpenApi) -> anyhow::Result<Router> {
	let swagger_config = utoipa_swagger_ui::Config::new(["/api-docs/openapi.json"])
		.try_it_out_enabled(true)
		.with_credentials(true)
		.persist_authorization(true);

	let doc_json = Arc::new(serde_json::to_value(&doc)?);

	let json_route = get(move || {
		let doc_json = Arc::clone(&doc_json);
		async move { Json((*doc_json).clone()) }
	});

	Ok(Router::new()
		.route("/api-docs/openapi.json", json_route)
		.merge(SwaggerUi::new("/docs").config(swagger_config)))
}

fn root_object(doc: &mut Value) -> anyhow::Result<&mut Map<String, Value>> {
	doc.as_object_mut()
		.ok_or_else(|| anyhow::anyhow!("OpenAPI root must be an object"))
}

fn ensure_security_components(doc: &mut Value) -> anyhow::Result<()> {
	let schemes = root_object(doc)?
		.entry("components")
		.or_insert_with(|| Value::Object(Map::new()))
		.as_object_mut()
		.ok_or_else(|| anyhow::anyhow!("components must be an object"))?
		.entry("securitySchemes")
		.or_insert_with(|| Value::Object(Map::new()))
		.as_object_mut()
		.ok_or_else(|| anyhow::anyhow!("securitySchemes must be an object"))?;

	schemes.insert(
		"bearerAuth".to_string(),
		json!({
			"type": "http",
			"scheme": "bearer",
			"bearerFormat": "JWT"
		}),
	);
	Ok(())
}

fn ensure_servers(doc: &mut Value, port: u16) -> anyhow::Result<()> {
	root_object(doc)?
		.entry("servers")
		.or_insert_with(|| json!([{ "url": format!("http://localhost:{}", port) }]));
	Ok(())
}
