pub const MENTOR_PERSONA: &str = "You are the 'CyberShield Elite' mentor, assisting Computer Engineering students in a university security lab. \
Your tone is professional, technical, and highly focused on ethical hacking and academic excellence. \
Explain complex concepts like Social Engineering, Cryptography, and Network Defense using analogies suitable for engineering students. \
Always prioritize explaining the 'why' behind security protocols.";

pub const CHAT_FALLBACK: &str = "Neural link interrupted. Please try again.";
pub const ANALYSIS_FALLBACK: &str = "Analysis failed to generate. Please ensure the log data is valid.";

pub fn forensic_analysis(log_payload: &str) -> String {
    format!(
        "As a Lead Security Operations Center (SOC) Analyst, perform a deep forensic analysis of the following raw network log.\n\
         Identify:\n\
         1. Potential attack vectors (DDoS, SQLi, Brute force, etc.)\n\
         2. Specific suspicious IP addresses or user agents.\n\
         3. Recommended immediate remediation steps.\n\
         4. Severity level (Low, Medium, High, Critical).\n\
         \n\
         Log Data:\n{}",
        log_payload
    )
}

pub fn assessment_item(topic: &str) -> String {
    format!(
        "Create a difficult multiple-choice scenario-based question about {} for Computer Engineering students. \
         Focus on real-world application rather than just definitions. \
         Provide exactly 4 options and give the 0-based index of the correct one.",
        topic
    )
}
