//! Static teaching content shown for each module.

use rand::seq::SliceRandom;
use serde::Serialize;

use super::ModuleType;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Card {
    pub title: &'static str,
    pub body: &'static str,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Panel {
    pub module: ModuleType,
    pub label: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub cards: &'static [Card],
}

const BASICS_CARDS: &[Card] = &[
    Card {
        title: "CIA Triad",
        body: "Confidentiality, Integrity, and Availability.",
    },
    Card {
        title: "Defense in Depth",
        body: "Layered security to prevent single points of failure.",
    },
    Card {
        title: "Zero Trust",
        body: "Never trust, always verify every access request.",
    },
];

const THREAT_CARDS: &[Card] = &[
    Card {
        title: "Ransomware",
        body: "Encrypts data at rest and spreads laterally over flat networks before demanding payment.",
    },
    Card {
        title: "Phishing",
        body: "Social engineering that harvests credentials through convincing look-alike messages.",
    },
    Card {
        title: "SQL Injection",
        body: "Untrusted input concatenated into queries lets attackers read or alter the database.",
    },
    Card {
        title: "DDoS",
        body: "Distributed floods exhaust bandwidth or connection tables until legitimate users are denied.",
    },
];

const DEFENSE_CARDS: &[Card] = &[
    Card {
        title: "Packet Filtering",
        body: "Stateful firewalls drop traffic that matches known-malicious signatures or violates policy.",
    },
    Card {
        title: "Segmentation",
        body: "VLANs and internal firewalls confine a compromise to the segment where it started.",
    },
    Card {
        title: "Least Privilege",
        body: "Accounts and services get only the permissions their task requires.",
    },
];

const PROBLEM_SOLVING_CARDS: &[Card] = &[Card {
    title: "Architectural Challenges",
    body: "Read the scenario, spot the critical flaw, and pick the control that fixes the architecture.",
}];

const AI_LAB_CARDS: &[Card] = &[
    Card {
        title: "Forensic Console",
        body: "Paste a suspicious log segment for attack-vector, indicator, remediation and severity analysis.",
    },
    Card {
        title: "Mentor Chat",
        body: "Ask technical questions; the mentor explains the why behind each protocol.",
    },
];

const QUIZ_CARDS: &[Card] = &[Card {
    title: "Scenario Questions",
    body: "Each correct answer is worth 150 experience points.",
}];

pub fn panel(module: ModuleType) -> Panel {
    let (title, description, cards) = match module {
        ModuleType::Basics => (
            "Security Fundamentals",
            "Core pillars of resilient digital infrastructure.",
            BASICS_CARDS,
        ),
        ModuleType::Threats => (
            "Threat Landscape",
            "Analyze tactics used by modern threat actors.",
            THREAT_CARDS,
        ),
        ModuleType::Defenses => (
            "Tactical Defenses",
            "Deploy active countermeasures.",
            DEFENSE_CARDS,
        ),
        ModuleType::ProblemSolving => (
            "Problem Solving Lab",
            "Analyze broken security architectures.",
            PROBLEM_SOLVING_CARDS,
        ),
        ModuleType::AiLab => (
            "AI Forensic Laboratory",
            "Real-time log analysis with Gemini.",
            AI_LAB_CARDS,
        ),
        ModuleType::Quiz => (
            "Field Competency Exam",
            "Validate your security knowledge.",
            QUIZ_CARDS,
        ),
    };
    Panel {
        module,
        label: module.label(),
        title,
        description,
        cards,
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ChallengeOption {
    pub text: &'static str,
    pub is_optimal: bool,
    pub feedback: &'static str,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Challenge {
    pub id: u32,
    pub title: &'static str,
    pub scenario: &'static str,
    pub flaw: &'static str,
    pub options: &'static [ChallengeOption],
}

pub const CHALLENGES: &[Challenge] = &[
    Challenge {
        id: 1,
        title: "The Flat Network Crisis",
        scenario: "A medium-sized university department has all its workstations, the web server, and the research database on the same VLAN (192.168.1.0/24). A student's laptop in the lab was infected with Ransomware.",
        flaw: "Lack of network segmentation allows the ransomware to spread laterally to the research database via simple SMB scanning.",
        options: &[
            ChallengeOption {
                text: "Install a stronger Anti-Virus on all workstations.",
                is_optimal: false,
                feedback: "AV is a host-based control. It doesn't solve the architectural flaw of a flat network. The attacker can still pivot if they bypass the AV.",
            },
            ChallengeOption {
                text: "Implement VLAN Segmentation and an Internal Firewall (Micro-segmentation).",
                is_optimal: true,
                feedback: "Correct! By placing the database in a private VLAN and restricting access via a firewall, you stop lateral movement even if a workstation is compromised.",
            },
            ChallengeOption {
                text: "Change all administrative passwords to be more complex.",
                is_optimal: false,
                feedback: "Complex passwords are good, but many lateral movement techniques (like Pass-the-Hash) don't require the plaintext password.",
            },
        ],
    },
    Challenge {
        id: 2,
        title: "Exposed API Endpoint",
        scenario: "An engineering project uses an API to report sensor data to a cloud database. The API key is currently hardcoded in the frontend JavaScript code of the dashboard.",
        flaw: "Anyone who views the source code of the dashboard can steal the API key and delete or modify research data.",
        options: &[
            ChallengeOption {
                text: "Obfuscate the JavaScript code to make it harder to read.",
                is_optimal: false,
                feedback: "Obfuscation is not security. It only delays a determined attacker for a few minutes.",
            },
            ChallengeOption {
                text: "Move the API call to a backend proxy server and use Environment Variables.",
                is_optimal: true,
                feedback: "Perfect. The frontend calls your server, and your server (securely holding the key) calls the API. The key never reaches the client.",
            },
            ChallengeOption {
                text: "Set the API key to expire every 24 hours.",
                is_optimal: false,
                feedback: "While rotation is good, it doesn't fix the fundamental leak. The attacker just needs to refresh the page to get the new key.",
            },
        ],
    },
];

/// Position of the challenge after `index`, wrapping to the first.
pub fn next_challenge_index(index: usize) -> usize {
    (index + 1) % CHALLENGES.len()
}

impl Challenge {
    pub fn answer(&self, option: usize) -> Option<&'static ChallengeOption> {
        self.options.get(option)
    }
}

pub const DEFAULT_QUIZ_TOPIC: &str = "Network Security & Threat Analysis";

const QUIZ_TOPICS: &[&str] = &[
    DEFAULT_QUIZ_TOPIC,
    "Network Defense",
    "Social Engineering",
    "Applied Cryptography",
    "Web Application Security",
    "Incident Response",
    "Zero Trust Architecture",
];

pub fn random_quiz_topic() -> &'static str {
    QUIZ_TOPICS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(DEFAULT_QUIZ_TOPIC)
}
