pub mod intake;
pub mod ledger;
