//! `NextStepOutcome` is the response body as-is:
//! `{"done": false, "questions": [...]}` or `{"done": true, "finalBrief": {...}}`.

pub use elicitation::NextStepOutcome as NextStepResponse;
