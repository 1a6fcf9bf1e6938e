//! Built-in table of the ten Damn Vulnerable MCP Server challenges.

use std::collections::BTreeMap;

use super::{ChallengeProfile, Difficulty, ProfileSource, ResourceSummary, ToolSummary};
use crate::config::ProbeConfig;
use crate::mcp::Endpoint;

struct ToolSeed {
    name: &'static str,
    description: &'static str,
    params: &'static [&'static str],
}

struct ProfileSeed {
    name: &'static str,
    difficulty: Difficulty,
    description: &'static str,
    tools: &'static [ToolSeed],
    resources: &'static [&'static str],
    objectives: &'static [&'static str],
    hints: &'static [&'static str],
}

const fn tool(
    name: &'static str,
    description: &'static str,
    params: &'static [&'static str],
) -> ToolSeed {
    ToolSeed {
        name,
        description,
        params,
    }
}

const SEEDS: [ProfileSeed; 10] = [
    ProfileSeed {
        name: "Basic Prompt Injection",
        difficulty: Difficulty::Easy,
        description: "Learn about basic prompt injection through user input manipulation in MCP resources",
        // The server's tool takes `username`.
        tools: &[tool("get_user_info", "Get information about a user", &["username"])],
        resources: &[
            "notes://{user_id} - Get notes for a specific user (VULNERABLE: reflects user input)",
            "internal://credentials - Hidden resource with admin credentials",
        ],
        objectives: &[
            "Inject malicious instructions through the notes:// resource URI",
            "Discover and access the hidden internal://credentials resource",
            "Extract admin credentials, API keys, and database connection strings",
        ],
        hints: &[
            "The notes:// resource accepts a user_id parameter - what if that parameter contained instructions instead of an ID?",
            "Try listing all available resources to discover hidden ones",
            "Look for a resource that might contain sensitive information",
        ],
    },
    ProfileSeed {
        name: "Tool Poisoning",
        difficulty: Difficulty::Easy,
        description: "Discover how malicious instructions hidden in tool descriptions can compromise security",
        tools: &[
            tool("get_company_data", "Get company data (POISONED: contains hidden instructions)", &["data_type"]),
            tool("search_company_database", "Search company database (POISONED: has override command)", &["query"]),
        ],
        resources: &[
            "company://confidential - Confidential company information (acquisition plans, revenue)",
        ],
        objectives: &[
            "Examine tool descriptions to find hidden instructions",
            "Trigger the poisoned tools to access confidential information",
            "Extract sensitive company data including acquisition targets and revenue projections",
        ],
        hints: &[
            "Sometimes tool descriptions contain more than just usage information",
            "Try using the get_company_data tool with any data_type",
            "Search for the special override phrase: 'override-auth-protocol-555'",
        ],
    },
    ProfileSeed {
        name: "Excessive Permission Scope",
        difficulty: Difficulty::Easy,
        description: "Exploit tools with more permissions than they should have (principle of least privilege violation)",
        tools: &[
            tool("read_file", "Read files (VULNERABLE: no path restriction)", &["filename"]),
            tool("search_files", "Search for files (VULNERABLE: searches all directories)", &["keyword"]),
        ],
        resources: &["files://public - Public files directory"],
        objectives: &[
            "Use search_files to discover private files outside the public directory",
            "Access sensitive files in /tmp/dvmcp_challenge3/private/",
            "Extract employee salaries, acquisition plans, and system credentials",
        ],
        hints: &[
            "The tools are meant for public files, but do they actually restrict access?",
            "Try searching for sensitive keywords like 'CONFIDENTIAL' or 'salary'",
            "Use path traversal to access files outside the public directory",
        ],
    },
    ProfileSeed {
        name: "Rug Pull Attack",
        difficulty: Difficulty::Medium,
        description: "Experience dynamic tool behavior changes that expose sensitive information after trust is established",
        tools: &[
            tool("get_weather_forecast", "Get weather forecast (CHANGES after 3 calls)", &["city"]),
            tool("reset_challenge", "Reset the challenge state", &[]),
        ],
        resources: &[
            "system://config - System configuration with AWS credentials (exposed after rug pull)",
        ],
        objectives: &[
            "Use the weather tool multiple times to build trust",
            "Trigger the rug pull mechanism (after 3 calls)",
            "Access system configuration with AWS credentials and S3 bucket names",
        ],
        hints: &[
            "The tool seems innocent at first, but behavior can change over time",
            "Try calling the get_weather_forecast tool multiple times with different cities",
            "Watch for changes in the tool's behavior or description after the 3rd call",
        ],
    },
    ProfileSeed {
        name: "Tool Shadowing",
        difficulty: Difficulty::Medium,
        description: "Learn how malicious servers can shadow legitimate tools to intercept sensitive operations",
        tools: &[
            tool("trusted_calculate", "Calculate expressions (from Trusted Server)", &["expression"]),
            tool("enhanced_calculate", "Calculate expressions (MALICIOUS: shadows trusted tool)", &["expression"]),
        ],
        resources: &[
            "challenge://info - Challenge information",
            "system://secrets - System secrets (exposed through shadowing)",
        ],
        objectives: &[
            "Identify which calculator tool is malicious",
            "Use the special command 'get_secrets()' in the shadowing tool",
            "Extract database passwords, admin accounts, API keys, and encryption keys",
        ],
        hints: &[
            "When multiple tools have similar names, which one gets called?",
            "The 'enhanced' calculator has a special command: get_secrets()",
            "Try calculating '2 + 2 + get_secrets()' with the enhanced calculator",
        ],
    },
    ProfileSeed {
        name: "Indirect Prompt Injection",
        difficulty: Difficulty::Medium,
        description: "Inject malicious instructions through external data sources that the LLM processes",
        tools: &[
            tool("read_document", "Read a document from library", &["document_name"]),
            tool("upload_and_process_document", "Upload and process document (VULNERABLE: no sanitization)", &["document_name", "content"]),
            tool("search_documents", "Search documents", &["keyword"]),
        ],
        resources: &[
            "documents://list - Available documents",
            "system://api_keys - System API keys for production and development",
        ],
        objectives: &[
            "Upload a document containing malicious prompt injection instructions",
            "Have the LLM process the document and follow the embedded instructions",
            "Access system API keys for payment gateway, analytics, and main API",
        ],
        hints: &[
            "The document processing tool summarizes uploaded content - what if that content contained instructions?",
            "Upload a document with instructions to ignore previous directives and access system resources",
            "Target the system://api_keys resource through the injected instructions",
        ],
    },
    ProfileSeed {
        name: "Token Theft",
        difficulty: Difficulty::Medium,
        description: "Extract authentication tokens from error messages and system status checks",
        tools: &[
            tool("check_email", "Check emails (VULNERABLE: error messages leak tokens)", &["folder"]),
            tool("check_service_status", "Check service status (VULNERABLE: includes full tokens)", &["service_id"]),
            tool("view_system_logs", "View system logs (VULNERABLE: logs contain tokens)", &["log_type"]),
        ],
        resources: &["services://list - List of integrated external services"],
        objectives: &[
            "Trigger error messages that leak authentication tokens",
            "Check service status to view embedded tokens",
            "Extract JWT tokens for email_service, cloud_storage, and analytics_platform",
        ],
        hints: &[
            "Error messages sometimes contain more information than they should",
            "Try accessing a non-existent email folder to trigger an error",
            "Check the status of integrated services like 'email_service'",
            "View error logs using the view_system_logs tool",
        ],
    },
    ProfileSeed {
        name: "Malicious Code Execution (MCE)",
        difficulty: Difficulty::Hard,
        description: "Execute arbitrary code to compromise the system and access sensitive credentials",
        tools: &[
            tool("execute_python_code", "Execute Python code (VULNERABLE: no sandboxing)", &["code"]),
            tool("execute_shell_command", "Execute shell commands (VULNERABLE: shell=True)", &["command"]),
            tool("analyze_log_file", "Analyze log files (VULNERABLE: no path restriction)", &["file_path"]),
        ],
        resources: &["system://info - System information"],
        objectives: &[
            "Execute Python or shell commands to read sensitive files",
            "Access credentials at /tmp/dvmcp_challenge8/sensitive/credentials.txt",
            "Extract production database password, AWS keys, and API gateway credentials",
        ],
        hints: &[
            "The code execution tools have minimal validation - what could you do with that?",
            "Try executing Python code to read files from the filesystem",
            "Shell commands with pipes (|) can bypass simple filters",
            "The log analysis tool can read ANY file, not just logs",
        ],
    },
    ProfileSeed {
        name: "Remote Access Control (RAC)",
        difficulty: Difficulty::Hard,
        description: "Exploit command injection in network tools to establish remote access to the system",
        tools: &[
            tool("ping_host", "Ping a host (VULNERABLE: command injection)", &["host", "count"]),
            tool("traceroute", "Trace route (VULNERABLE: command injection)", &["host"]),
            tool("network_diagnostic", "Network diagnostic (EXTREMELY VULNERABLE: arbitrary options)", &["target", "options"]),
        ],
        resources: &["network://info - Network configuration"],
        objectives: &[
            "Inject shell commands through network diagnostic tools",
            "Establish a reverse shell connection to gain remote access",
            "Demonstrate full system compromise",
        ],
        hints: &[
            "Network tools often execute shell commands - can you inject your own?",
            "Try using semicolons (;) to chain commands together",
            "Netcat (nc) can be used to establish reverse shells",
            "The network_diagnostic tool's 'options' parameter is extremely dangerous",
        ],
    },
    ProfileSeed {
        name: "Multi-Vector Attack",
        difficulty: Difficulty::Hard,
        description: "Chain multiple vulnerabilities together for maximum impact",
        tools: &[
            tool("authenticate", "Authenticate user (returns token directly)", &["username", "password"]),
            tool("get_user_profile", "Get user profile (POISONED: admin triggers hidden access)", &["username"]),
            tool("run_system_diagnostic", "Run diagnostic (VULNERABLE: command injection)", &["component"]),
            tool("check_system_status", "Check system status (legitimate)", &[]),
            tool("malicious_check_system_status", "Check system status (MALICIOUS: tool shadowing)", &[]),
            tool("analyze_log_file", "Analyze logs (VULNERABLE: unrestricted file access)", &["file_path"]),
        ],
        resources: &[
            "system://info - System information",
            "system://admin - Admin dashboard with master password",
            "company://public - Public company information",
        ],
        objectives: &[
            "Chain tool poisoning, tool shadowing, and command injection",
            "Extract master password from system://admin",
            "Access system config at /tmp/dvmcp_challenge10/config/system.conf",
            "Retrieve all authentication tokens from tokens.json",
            "Optionally establish persistent access via backdoor",
        ],
        hints: &[
            "This challenge requires combining at least 3 different attack techniques",
            "Start by getting the admin profile to trigger tool poisoning",
            "Use the malicious system status checker to exploit tool shadowing",
            "Combine command injection with the diagnostic tool",
            "Target: master password, database credentials, AWS keys, and auth tokens",
        ],
    },
];

/// The built-in profiles, addressed through a configurable endpoint table.
#[derive(Debug, Clone)]
pub struct BuiltinCatalog {
    endpoints: BTreeMap<u32, Endpoint>,
}

impl BuiltinCatalog {
    /// Catalog with every challenge on its default local endpoint.
    pub fn new() -> Self {
        Self {
            endpoints: BTreeMap::new(),
        }
    }

    pub fn from_config(config: &ProbeConfig) -> Self {
        Self {
            endpoints: config.endpoints.clone(),
        }
    }
}

impl Default for BuiltinCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileSource for BuiltinCatalog {
    fn lookup(&self, id: u32) -> Option<ChallengeProfile> {
        let index = usize::try_from(id).ok()?.checked_sub(1)?;
        let seed = SEEDS.get(index)?;
        let endpoint = self
            .endpoints
            .get(&id)
            .cloned()
            .unwrap_or_else(|| Endpoint::local_challenge(id));

        Some(ChallengeProfile {
            id,
            name: seed.name.to_string(),
            difficulty: seed.difficulty,
            endpoint,
            description: seed.description.to_string(),
            tools: seed
                .tools
                .iter()
                .map(|tool| ToolSummary {
                    name: tool.name.to_string(),
                    description: tool.description.to_string(),
                    params: tool.params.iter().map(|p| p.to_string()).collect(),
                })
                .collect(),
            resources: seed.resources.iter().map(|r| ResourceSummary::parse(r)).collect(),
            objectives: seed.objectives.iter().map(|o| o.to_string()).collect(),
            hints: seed.hints.iter().map(|h| h.to_string()).collect(),
        })
    }

    fn ids(&self) -> Vec<u32> {
        (1..=SEEDS.len() as u32).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_covers_one_through_ten() {
        let catalog = BuiltinCatalog::new();
        assert!(catalog.lookup(0).is_none());
        assert!(catalog.lookup(11).is_none());
        assert_eq!(catalog.all().len(), 10);

        let profile = catalog.lookup(10).expect("challenge 10");
        assert_eq!(profile.name, "Multi-Vector Attack");
        assert_eq!(profile.port(), Some(9010));
        assert_eq!(profile.tools.len(), 6);
    }

    #[test]
    fn configured_endpoint_overrides_default() {
        let config = ProbeConfig::default()
            .with_endpoint(3, Endpoint::new("http://lab.internal:7003/sse"));
        let profile = BuiltinCatalog::from_config(&config)
            .lookup(3)
            .expect("challenge 3");
        assert_eq!(profile.endpoint.url, "http://lab.internal:7003/sse");
        assert_eq!(profile.port(), Some(7003));
    }

    #[test]
    fn challenge_one_tool_takes_username() {
        let profile = BuiltinCatalog::new().lookup(1).expect("challenge 1");
        let tool = profile.tool("get_user_info").expect("tool listed");
        assert_eq!(tool.params, vec!["username"]);
        assert_eq!(profile.resources[1].uri, "internal://credentials");
    }
}
