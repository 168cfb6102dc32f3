use {
    crate::kernel::entities::UserId,
    sqlx::FromRow,
};

#[derive(Clone, Debug, PartialEq, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub enum UserRole {
    Buyer,
    Seller,
    Admin,
}

/// A user row as issued by the auth collaborator. This server only reads
/// users; account management lives elsewhere.
#[derive(Clone, FromRow, Debug)]
pub struct User {
    pub id:         UserId,
    pub username:   String,
    pub first_name: String,
    pub last_name:  String,
    pub email:      String,
    pub role:       UserRole,
    pub is_active:  bool,
}

impl User {
    pub fn can_create_auctions(&self) -> bool {
        matches!(self.role, UserRole::Seller | UserRole::Admin)
    }
}
