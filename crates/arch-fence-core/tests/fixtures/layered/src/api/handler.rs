use crate::domain::User;
use crate::infra::db::{self, Pool};

pub fn handle(_pool: Pool) -> Option<User> {
    let _ = db::Pool;
    None
}
