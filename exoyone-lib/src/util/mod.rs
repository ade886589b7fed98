pub mod color;
pub mod mock_device;
pub mod truthy;
