pub mod finalize_request;
pub mod finalize_response;
pub mod finalize_route;
