#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum TableError {
    #[error("[HashTable]Key Is Not Exist")]
    KeyNotFound,
    #[error("[HashTable]Cannot Allocate {capacity} Slots")]
    AllocationFailure { capacity: usize },
    #[error("[HashTable]Max Load Factor {0} Is Not In (0, 1]")]
    InvalidLoadFactor(f64),
}
