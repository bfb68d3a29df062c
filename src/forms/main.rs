use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct SlugForm {
    #[validate(length(min = 1, max = 255))]
    pub text: String,
}
