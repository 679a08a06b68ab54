pub mod channels;
pub mod device;
pub mod messages;
pub mod notification;

pub use device::DeviceService;
pub use notification::NotificationService;
