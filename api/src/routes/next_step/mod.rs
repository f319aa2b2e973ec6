pub mod next_step_request;
pub mod next_step_response;
pub mod next_step_route;
