//! Injected side-effect channels for rule resolution

use crate::bus::notify::NotificationSink;
use crate::dice::DiceRoller;

/// Dice and message sink handed to every rule that rolls or reports
pub struct Arbiter<'a> {
    pub dice: &'a mut dyn DiceRoller,
    pub sink: &'a mut dyn NotificationSink,
}

impl<'a> Arbiter<'a> {
    pub fn new(dice: &'a mut dyn DiceRoller, sink: &'a mut dyn NotificationSink) -> Self {
        Self { dice, sink }
    }

    pub fn say(&mut self, text: impl AsRef<str>) {
        self.sink.message(text.as_ref());
    }
}
