pub mod system;

pub use system::generate_system_instruction;
