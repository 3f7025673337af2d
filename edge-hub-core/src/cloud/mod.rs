mod listener;
mod subscription_sync;

pub use listener::CloudConnectionListener;
pub use subscription_sync::SubscriptionSynchronizer;
