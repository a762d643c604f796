pub mod cycle;
pub mod initiative;
pub mod issue;
pub mod readiness;
pub mod team;
