#[derive(Default)]
pub struct Pool;
