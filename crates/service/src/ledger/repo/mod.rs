pub mod seaorm;

pub use seaorm::SeaOrmLedgerRepository;
