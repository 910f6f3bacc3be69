mod init;
mod reconcile;

pub use init::cmd_init;
pub use reconcile::cmd_reconcile;
