//! Bounded integer input with decrement/increment buttons and a free-text field.
//!
//! The stepper only tracks what is displayed and reports what the user did.
//! Finalizing a value (clamping, rejecting) is left to whoever owns the data,
//! which is why blur carries no value of its own.

/// Change reported by a [`StepperInput`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepperChange {
    /// A button produced a new value.
    Value(i64),
    /// The text field was edited; `None` when the text is not an integer.
    Edited(Option<i64>),
    /// The field lost focus.
    Blur,
}

/// Bounds and button overrides handed to a stepper by its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepperBounds {
    pub min: i64,
    pub max: i64,
    pub disable_minus: bool,
    pub disable_plus: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepperInput {
    name: String,
    min: i64,
    max: i64,
    step: i64,
    value: i64,
    disable_minus: bool,
    disable_plus: bool,
    draft: Option<String>,
}

impl StepperInput {
    pub fn new(name: impl Into<String>, min: i64, max: i64, value: i64) -> Self {
        Self {
            name: name.into(),
            min,
            max,
            step: 1,
            value,
            disable_minus: false,
            disable_plus: false,
            draft: None,
        }
    }

    pub fn with_step(mut self, step: i64) -> Self {
        self.step = step.max(1);
        self
    }

    pub fn with_bounds(mut self, bounds: StepperBounds) -> Self {
        self.apply_bounds(bounds);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> i64 {
        self.value
    }

    pub fn min(&self) -> i64 {
        self.min
    }

    pub fn max(&self) -> i64 {
        self.max
    }

    /// Text being typed, if an edit is in progress.
    pub fn draft(&self) -> Option<&str> {
        self.draft.as_deref()
    }

    pub fn is_editing(&self) -> bool {
        self.draft.is_some()
    }

    pub fn can_decrement(&self) -> bool {
        !self.disable_minus && self.value > self.min
    }

    pub fn can_increment(&self) -> bool {
        !self.disable_plus && self.value < self.max
    }

    pub fn decrement(&mut self) -> Option<StepperChange> {
        if !self.can_decrement() {
            return None;
        }
        self.value = self.value.saturating_sub(self.step);
        self.draft = None;
        Some(StepperChange::Value(self.value))
    }

    pub fn increment(&mut self) -> Option<StepperChange> {
        if !self.can_increment() {
            return None;
        }
        self.value = self.value.saturating_add(self.step);
        self.draft = None;
        Some(StepperChange::Value(self.value))
    }

    /// Replace the field text and report what it parses to.
    pub fn edit(&mut self, text: impl Into<String>) -> StepperChange {
        let text = text.into();
        let parsed = parse_count(&text);
        if let Some(value) = parsed {
            self.value = value;
        }
        self.draft = Some(text);
        StepperChange::Edited(parsed)
    }

    /// Append a typed character to the draft. Non-digits are ignored.
    pub fn push_digit(&mut self, ch: char) -> Option<StepperChange> {
        if !ch.is_ascii_digit() {
            return None;
        }
        let mut text = self.draft.take().unwrap_or_default();
        text.push(ch);
        Some(self.edit(text))
    }

    /// Remove the last draft character; starts a draft from the shown value.
    pub fn pop_char(&mut self) -> StepperChange {
        let mut text = self
            .draft
            .take()
            .unwrap_or_else(|| self.value.to_string());
        text.pop();
        self.edit(text)
    }

    pub fn blur(&mut self) -> StepperChange {
        self.draft = None;
        StepperChange::Blur
    }

    /// Refresh the displayed value and bounds from the owner's state.
    ///
    /// A draft the owner did not accept as typed is dropped, so the field
    /// shows the stored value and the next digit starts a fresh draft.
    pub fn sync(&mut self, value: i64, bounds: StepperBounds) {
        if self.draft.as_deref().and_then(parse_count) != Some(value) {
            self.draft = None;
        }
        self.value = value;
        self.apply_bounds(bounds);
    }

    fn apply_bounds(&mut self, bounds: StepperBounds) {
        self.min = bounds.min;
        self.max = bounds.max.max(0);
        self.disable_minus = bounds.disable_minus;
        self.disable_plus = bounds.disable_plus;
    }

    /// One-line rendering: `[-] 2 [+]`, disabled buttons drawn empty.
    pub fn render(&self) -> String {
        let minus = if self.can_decrement() { "[-]" } else { "[ ]" };
        let plus = if self.can_increment() { "[+]" } else { "[ ]" };
        let shown = match &self.draft {
            Some(text) => format!("{text}_"),
            None => self.value.to_string(),
        };
        format!("{minus} {shown:^4} {plus}")
    }
}

/// Parse a count typed by the user as a base-10 integer.
pub fn parse_count(text: &str) -> Option<i64> {
    text.trim().parse::<i64>().ok()
}
