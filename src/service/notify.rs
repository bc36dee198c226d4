/// Receives generic failure alerts raised by services.
pub trait Notifier
where
	Self: Send + Sync,
{
	/// Surfaces a failure message to the user.
	fn notify(&self, message: &str);
}
impl<F> Notifier for F
where
	F: Send + Sync + Fn(&str),
{
	fn notify(&self, message: &str) {
		self(message)
	}
}

/// Notifier that drops every alert.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopNotifier;
impl Notifier for NoopNotifier {
	fn notify(&self, _: &str) {}
}
