pub mod content;
pub mod simulator;

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModuleType {
    Basics,
    Threats,
    Defenses,
    ProblemSolving,
    AiLab,
    Quiz,
}

impl ModuleType {
    pub const ALL: [ModuleType; 6] = [
        ModuleType::Basics,
        ModuleType::Threats,
        ModuleType::Defenses,
        ModuleType::ProblemSolving,
        ModuleType::AiLab,
        ModuleType::Quiz,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            ModuleType::Basics => "basics",
            ModuleType::Threats => "threats",
            ModuleType::Defenses => "defenses",
            ModuleType::ProblemSolving => "problem-solving",
            ModuleType::AiLab => "ai-lab",
            ModuleType::Quiz => "quiz",
        }
    }

    /// Sidebar label.
    pub fn label(&self) -> &'static str {
        match self {
            ModuleType::Basics => "Security Basics",
            ModuleType::Threats => "Common Threats",
            ModuleType::Defenses => "Network Defenses",
            ModuleType::ProblemSolving => "Problem Solving",
            ModuleType::AiLab => "Security AI Lab",
            ModuleType::Quiz => "Skills Assessment",
        }
    }
}

impl fmt::Display for ModuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownModule(pub String);

impl fmt::Display for UnknownModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown module: {}", self.0)
    }
}

impl std::error::Error for UnknownModule {}

impl FromStr for ModuleType {
    type Err = UnknownModule;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModuleType::ALL
            .into_iter()
            .find(|m| m.slug() == s)
            .ok_or_else(|| UnknownModule(s.to_string()))
    }
}

/// Which module is on screen and which ones the student has finished.
/// Lives only as long as the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellState {
    active: ModuleType,
    completed: BTreeSet<ModuleType>,
}

impl Default for ShellState {
    fn default() -> Self {
        Self {
            active: ModuleType::Basics,
            completed: BTreeSet::from([ModuleType::Basics]),
        }
    }
}

impl ShellState {
    pub fn active(&self) -> ModuleType {
        self.active
    }

    pub fn select(&mut self, module: ModuleType) {
        self.active = module;
    }

    pub fn complete(&mut self, module: ModuleType) {
        self.completed.insert(module);
    }

    pub fn is_completed(&self, module: ModuleType) -> bool {
        self.completed.contains(&module)
    }

    /// Percentage of modules completed, rounded.
    pub fn progress(&self) -> u8 {
        let total = ModuleType::ALL.len() as f64;
        ((self.completed.len() as f64 / total) * 100.0).round() as u8
    }
}
