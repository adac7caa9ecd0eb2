//! Fixed scenario catalogs.
//!
//! Incidents are drawn from cloud provider → component → issue; changes from
//! change type → scenario plus three phrase pools. Phrase templates use the
//! `{change_type}` and `{activity}` placeholders.

#[derive(Debug, Clone, Copy)]
pub struct CloudProvider {
    pub name: &'static str,
    pub components: &'static [Component],
}

#[derive(Debug, Clone, Copy)]
pub struct Component {
    pub name: &'static str,
    pub issues: &'static [&'static str],
}

pub const CLOUD_PROVIDERS: &[CloudProvider] = &[
    CloudProvider {
        name: "Azure",
        components: &[
            Component {
                name: "AKS",
                issues: &[
                    "Node not ready",
                    "Pod scheduling failed",
                    "Service endpoint unreachable",
                    "Container runtime errors",
                    "Cluster autoscaling issues",
                ],
            },
            Component {
                name: "VM",
                issues: &[
                    "High CPU utilization",
                    "Disk space running low",
                    "Network connectivity issues",
                    "Memory leak detected",
                    "Boot failure",
                ],
            },
            Component {
                name: "SQL MI",
                issues: &[
                    "Performance degradation",
                    "Backup failure",
                    "High memory pressure",
                    "Connectivity timeout",
                    "Database corruption",
                ],
            },
            Component {
                name: "ASE",
                issues: &[
                    "Web app not responding",
                    "SSL certificate expired",
                    "Worker process crashed",
                    "Deployment failure",
                    "Integration errors",
                ],
            },
        ],
    },
    CloudProvider {
        name: "GCP",
        components: &[
            Component {
                name: "GKE",
                issues: &[
                    "Node pool autoscaling failed",
                    "Load balancer misconfiguration",
                    "Container image pull errors",
                    "Network policy conflicts",
                    "Control plane unresponsive",
                ],
            },
            Component {
                name: "Compute Engine",
                issues: &[
                    "Instance terminated unexpectedly",
                    "Network latency spike",
                    "Disk I/O performance issues",
                    "Resource quota exceeded",
                    "Security group misconfiguration",
                ],
            },
            Component {
                name: "Cloud SQL",
                issues: &[
                    "Replication lag",
                    "Query performance degradation",
                    "Storage capacity critical",
                    "Backup validation failed",
                    "Failover test failed",
                ],
            },
        ],
    },
];

#[derive(Debug, Clone, Copy)]
pub struct ChangeType {
    pub name: &'static str,
    pub scenarios: &'static [&'static str],
}

pub const CHANGE_TYPES: &[ChangeType] = &[
    ChangeType {
        name: "Azure VM",
        scenarios: &[
            "OS upgrade",
            "Network configuration update",
            "Storage expansion",
            "Security hardening",
            "Instance type upgrade",
            "High availability configuration",
        ],
    },
    ChangeType {
        name: "Azure AKS",
        scenarios: &[
            "Kubernetes version upgrade",
            "Node pool expansion",
            "Security policy implementation",
            "Networking configuration update",
            "Autoscaling implementation",
            "Container registry integration",
        ],
    },
    ChangeType {
        name: "Azure SQL",
        scenarios: &[
            "Database performance tuning",
            "Storage allocation increase",
            "Backup policy update",
            "High availability configuration",
            "Security audit implementation",
            "Query optimization",
        ],
    },
    ChangeType {
        name: "Azure SQL MI",
        scenarios: &[
            "Instance sizing update",
            "Storage allocation increase",
            "Read replica deployment",
            "Geo-replication setup",
            "Backup retention policy update",
            "Performance tier upgrade",
        ],
    },
    ChangeType {
        name: "Azure ASE",
        scenarios: &[
            "App Service scaling",
            "Runtime version upgrade",
            "Network integration update",
            "SSL certificate rotation",
            "Custom domain configuration",
            "Autoscale settings modification",
        ],
    },
    ChangeType {
        name: "GCP VM",
        scenarios: &[
            "Instance resize",
            "OS patching",
            "Network interface update",
            "Startup script modification",
            "Managed instance group update",
        ],
    },
    ChangeType {
        name: "GCP GKE",
        scenarios: &[
            "Cluster upgrade",
            "Node auto-provisioning setup",
            "Pod security policy implementation",
            "Network policy update",
            "Workload identity configuration",
        ],
    },
    ChangeType {
        name: "GCP Cloud SQL",
        scenarios: &[
            "Instance scaling",
            "Maintenance window adjustment",
            "High availability configuration",
            "Backup retention policy update",
            "Read replica creation",
        ],
    },
];

pub const OBJECTIVE_PHRASES: &[&str] = &[
    "Implement {change_type} {activity} to improve system stability",
    "Resolve underlying issues identified in related incidents",
    "Enhance performance and reliability of the {change_type} infrastructure",
    "Apply industry best practices for {change_type} configuration",
];

pub const PLAN_STEP_PHRASES: &[&str] = &[
    "1. Conduct pre-implementation testing in development environment",
    "2. Schedule maintenance window for {change_type} modifications",
    "3. Create system backup and verify recovery procedures",
    "4. Implement {activity} according to documented procedures",
    "5. Validate functionality and performance post-implementation",
    "6. Update documentation and knowledge base articles",
];

pub const IMPACT_PHRASES: &[&str] = &[
    "Affected Systems: {change_type} infrastructure and dependent services",
    "User Impact: Minimal to moderate during implementation window",
    "Service Interruption: 15-30 minutes expected during cutover phase",
    "Recovery Plan: Rollback to previous configuration if issues detected",
];

/// Substitute the phrase placeholders.
pub fn render_phrase(template: &str, change_type: &str, activity: &str) -> String {
    template
        .replace("{change_type}", change_type)
        .replace("{activity}", activity)
}

/// Look up a change type by display name.
pub fn change_type(name: &str) -> Option<&'static ChangeType> {
    CHANGE_TYPES.iter().find(|t| t.name == name)
}
