use {
    crate::UserId,
    serde::{
        Deserialize,
        Serialize,
    },
    utoipa::ToSchema,
};

/// The public slice of a user profile attached to bids and presence events.
#[derive(Serialize, Deserialize, ToSchema, Clone, Debug, PartialEq)]
pub struct UserSummary {
    /// The id of the user
    #[schema(example = "obo3ee3e-58cc-4372-a567-0e02b2c3d479", value_type = String)]
    pub id:         UserId,
    /// The public handle of the user
    #[schema(example = "vintage_hunter")]
    pub username:   String,
    #[schema(example = "John")]
    pub first_name: String,
    #[schema(example = "Doe")]
    pub last_name:  String,
}
