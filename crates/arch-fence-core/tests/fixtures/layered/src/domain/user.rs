use std::fmt;

use crate::infra;
use serde::Serialize;

#[derive(Serialize)]
pub struct User {
    pub name: String,
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let _ = infra::db::Pool::default();
        write!(f, "{}", self.name)
    }
}
