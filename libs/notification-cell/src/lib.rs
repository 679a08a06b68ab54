// =====================================================================================
// NOTIFICATION CELL - IN-APP NOTIFICATIONS, FCM PUSH, EMAIL FALLBACK
// =====================================================================================

pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{
    Device, DeliveryOutcome, Notification, NotificationError, NotificationKind,
    OutgoingNotification, Platform,
};
pub use router::{device_routes, notification_routes};
pub use services::channels::{EmailSender, FcmPushSender, PushSender, SmtpEmailSender};
pub use services::messages::{AppointmentNotice, ExamNotice};
pub use services::NotificationService;
