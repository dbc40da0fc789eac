//! Fixed vocabulary of backbone stages.

use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// Named backbone stage, ordered from the stem outward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Conv1,
    Conv2,
    Conv3,
    Conv4,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Conv1, Stage::Conv2, Stage::Conv3, Stage::Conv4];

    /// 1-based position, matching the `convN` name.
    pub fn ordinal(self) -> usize {
        self as usize + 1
    }

    pub fn name(self) -> &'static str {
        match self {
            Stage::Conv1 => "conv1",
            Stage::Conv2 => "conv2",
            Stage::Conv3 => "conv3",
            Stage::Conv4 => "conv4",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Stage {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stage::ALL
            .into_iter()
            .find(|stage| stage.name() == s)
            .ok_or_else(|| ModelError::UnknownStage(s.to_string()))
    }
}

/// Ordered set of stages; iteration always follows backbone order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct StageSet(u8);

impl StageSet {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn all() -> Self {
        Stage::ALL.into_iter().collect()
    }

    pub fn single(stage: Stage) -> Self {
        Self(1 << stage as u8)
    }

    /// Parse a list of stage names such as `["conv3", "conv4"]`.
    pub fn parse<S: AsRef<str>>(names: &[S]) -> Result<Self, ModelError> {
        names
            .iter()
            .map(|name| name.as_ref().parse::<Stage>())
            .collect()
    }

    pub fn insert(&mut self, stage: Stage) {
        self.0 |= 1 << stage as u8;
    }

    pub fn contains(self, stage: Stage) -> bool {
        self.0 & (1 << stage as u8) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Deepest stage in the set.
    pub fn last(self) -> Option<Stage> {
        self.iter().last()
    }

    pub fn iter(self) -> impl Iterator<Item = Stage> {
        Stage::ALL.into_iter().filter(move |s| self.contains(*s))
    }

    pub fn names(self) -> Vec<&'static str> {
        self.iter().map(Stage::name).collect()
    }
}

impl FromIterator<Stage> for StageSet {
    fn from_iter<I: IntoIterator<Item = Stage>>(iter: I) -> Self {
        let mut set = StageSet::empty();
        for stage in iter {
            set.insert(stage);
        }
        set
    }
}

/// One value per stage, addressed by [`Stage`] rather than by string key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PerStage<T> {
    pub conv1: T,
    pub conv2: T,
    pub conv3: T,
    pub conv4: T,
}

impl<T: Copy> PerStage<T> {
    pub fn splat(value: T) -> Self {
        Self {
            conv1: value,
            conv2: value,
            conv3: value,
            conv4: value,
        }
    }

    pub fn get(&self, stage: Stage) -> T {
        match stage {
            Stage::Conv1 => self.conv1,
            Stage::Conv2 => self.conv2,
            Stage::Conv3 => self.conv3,
            Stage::Conv4 => self.conv4,
        }
    }
}

impl<T> PerStage<T> {
    pub fn get_mut(&mut self, stage: Stage) -> &mut T {
        match stage {
            Stage::Conv1 => &mut self.conv1,
            Stage::Conv2 => &mut self.conv2,
            Stage::Conv3 => &mut self.conv3,
            Stage::Conv4 => &mut self.conv4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_set_iterates_in_backbone_order() {
        let set = StageSet::parse(&["conv4", "conv1", "conv3"]).unwrap();
        assert_eq!(set.names(), vec!["conv1", "conv3", "conv4"]);
        assert_eq!(set.last(), Some(Stage::Conv4));
        assert_eq!(set.len(), 3);
        assert!(!set.contains(Stage::Conv2));
    }

    #[test]
    fn unknown_stage_name_is_rejected() {
        let err = StageSet::parse(&["conv2", "conv7"]).unwrap_err();
        assert!(matches!(err, ModelError::UnknownStage(name) if name == "conv7"));
    }

    #[test]
    fn per_stage_accessors_address_fields() {
        let mut values = PerStage::splat(0u8);
        *values.get_mut(Stage::Conv3) = 7;
        assert_eq!(values.conv3, 7);
        assert_eq!(values.get(Stage::Conv3), 7);
        assert_eq!(values.get(Stage::Conv1), 0);
    }
}
