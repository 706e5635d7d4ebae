pub mod enums;
pub mod usecases;
