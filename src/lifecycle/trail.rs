//! Ordered record of step outcomes for a single run.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Created,
    IpAssigned,
    SshConnection,
    Deletion,
}

impl Step {
    pub fn name(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::IpAssigned => "ip_assigned",
            Self::SshConnection => "ssh_connection",
            Self::Deletion => "deletion",
        }
    }

    fn separator(self) -> &'static str {
        match self {
            Self::Deletion => " ",
            _ => ", ",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failed,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("Success"),
            Self::Failed => f.write_str("Failed"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Append-only list of `(step, outcome)` pairs, at most one per step.
pub struct StatusTrail {
    entries: Vec<(Step, Outcome)>,
}

impl StatusTrail {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, step: Step, outcome: Outcome) {
        debug_assert!(
            self.outcome(step).is_none(),
            "step {step} recorded twice"
        );
        self.entries.push((step, outcome));
    }

    pub fn success(&mut self, step: Step) {
        self.record(step, Outcome::Success);
    }

    pub fn failure(&mut self, step: Step) {
        self.record(step, Outcome::Failed);
    }

    pub fn entries(&self) -> &[(Step, Outcome)] {
        &self.entries
    }

    pub fn outcome(&self, step: Step) -> Option<Outcome> {
        self.entries
            .iter()
            .find(|(s, _)| *s == step)
            .map(|(_, outcome)| *outcome)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if at least one step ran and none failed.
    pub fn all_succeeded(&self) -> bool {
        !self.entries.is_empty() && self.entries.iter().all(|(_, o)| *o == Outcome::Success)
    }

    /// Flattens the trail into the reported value, e.g.
    /// `"vm_created:Success, vm_ip_assigned:Failed, "`.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for StatusTrail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (step, outcome) in &self.entries {
            write!(f, "vm_{}:{}{}", step.name(), outcome, step.separator())?;
        }
        Ok(())
    }
}
