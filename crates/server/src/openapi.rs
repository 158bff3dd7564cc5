use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(ToSchema)]
pub struct AddressDoc {
    pub postal_code: Option<String>,
    pub street: Option<String>,
    pub house_number: Option<i32>,
    pub district: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub complement: Option<String>,
}

#[derive(ToSchema)]
pub struct ServiceRequest {
    pub neighborhood: String,
    pub kind: String,
    pub document: String,
    pub provider: String,
    pub fee_applied: bool,
    pub card_machine: bool,
    /// Comma-decimal amount, e.g. "10,50".
    pub value: String,
    pub note: Option<String>,
    pub address: Option<AddressDoc>,
}

#[derive(ToSchema)]
pub struct NeighborhoodRequest {
    pub name: String,
    pub fee: String,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::login,
        crate::routes::auth::me,
        crate::routes::neighborhoods::fee,
        crate::routes::services::create,
        crate::routes::services::transition,
        crate::routes::dashboard::report,
        crate::routes::navigation::route_links,
    ),
    components(
        schemas(
            HealthResponse,
            LoginRequest,
            AddressDoc,
            ServiceRequest,
            NeighborhoodRequest,
        )
    ),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "neighborhoods"),
        (name = "services"),
        (name = "dashboard"),
        (name = "navigation")
    )
)]
pub struct ApiDoc;
