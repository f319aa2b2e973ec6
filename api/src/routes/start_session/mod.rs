pub mod start_session_request;
pub mod start_session_response;
pub mod start_session_route;
