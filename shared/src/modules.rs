//! Dashboard module access
//!
//! A static table maps a user role to the dashboard sections it may open.
//! The company's subscription narrows that set further: a module is usable
//! only when both the role and the plan allow it. A few modules are always
//! on so an unpaid company can still subscribe and reach support.

use serde::{Deserialize, Serialize};

/// Dashboard module identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Module {
    Dashboard,
    Reservations,
    Tables,
    Menu,
    Inventory,
    Orders,
    Blog,
    Faq,
    Content,
    Contacts,
    Support,
    Settings,
    Users,
    Billing,
}

impl Module {
    pub const ALL: &'static [Module] = &[
        Module::Dashboard,
        Module::Reservations,
        Module::Tables,
        Module::Menu,
        Module::Inventory,
        Module::Orders,
        Module::Blog,
        Module::Faq,
        Module::Content,
        Module::Contacts,
        Module::Support,
        Module::Settings,
        Module::Users,
        Module::Billing,
    ];

    /// Modules that do not depend on the subscription plan
    pub const ALWAYS_ON: &'static [Module] = &[
        Module::Dashboard,
        Module::Settings,
        Module::Billing,
        Module::Support,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Module::Dashboard => "dashboard",
            Module::Reservations => "reservations",
            Module::Tables => "tables",
            Module::Menu => "menu",
            Module::Inventory => "inventory",
            Module::Orders => "orders",
            Module::Blog => "blog",
            Module::Faq => "faq",
            Module::Content => "content",
            Module::Contacts => "contacts",
            Module::Support => "support",
            Module::Settings => "settings",
            Module::Users => "users",
            Module::Billing => "billing",
        }
    }
}

/// Parse a module identifier (as stored in package feature lists)
pub fn parse_module(s: &str) -> Option<Module> {
    Module::ALL.iter().copied().find(|m| m.as_str() == s)
}

/// Company user roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Owner,
    Admin,
    Manager,
    Staff,
    /// Operator of the whole platform (pricing packages, every ticket)
    PlatformAdmin,
}

impl Role {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "owner" => Some(Self::Owner),
            "admin" => Some(Self::Admin),
            "manager" => Some(Self::Manager),
            "staff" => Some(Self::Staff),
            "platform_admin" => Some(Self::PlatformAdmin),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Staff => "staff",
            Self::PlatformAdmin => "platform_admin",
        }
    }

    /// Roles an owner/admin may hand out when creating company users
    pub fn is_assignable(&self) -> bool {
        matches!(self, Self::Admin | Self::Manager | Self::Staff)
    }
}

const OWNER_MODULES: &[Module] = Module::ALL;

const ADMIN_MODULES: &[Module] = &[
    Module::Dashboard,
    Module::Reservations,
    Module::Tables,
    Module::Menu,
    Module::Inventory,
    Module::Orders,
    Module::Blog,
    Module::Faq,
    Module::Content,
    Module::Contacts,
    Module::Support,
    Module::Settings,
    Module::Users,
];

const MANAGER_MODULES: &[Module] = &[
    Module::Dashboard,
    Module::Reservations,
    Module::Menu,
    Module::Inventory,
    Module::Orders,
    Module::Tables,
    Module::Content,
    Module::Support,
];

const STAFF_MODULES: &[Module] = &[
    Module::Dashboard,
    Module::Reservations,
    Module::Orders,
    Module::Tables,
];

/// Role string → enabled modules. Unknown roles get nothing.
pub fn modules_for_role(role: &str) -> &'static [Module] {
    match Role::from_db(role) {
        Some(Role::Owner) | Some(Role::PlatformAdmin) => OWNER_MODULES,
        Some(Role::Admin) => ADMIN_MODULES,
        Some(Role::Manager) => MANAGER_MODULES,
        Some(Role::Staff) => STAFF_MODULES,
        None => &[],
    }
}

/// Role modules ∩ plan features, plus the always-on set.
///
/// `plan_features` is the raw feature list of the active subscription;
/// unknown identifiers are ignored. `None` means no active subscription.
pub fn effective_modules(role: &str, plan_features: Option<&[String]>) -> Vec<Module> {
    modules_for_role(role)
        .iter()
        .copied()
        .filter(|m| {
            Module::ALWAYS_ON.contains(m)
                || plan_features
                    .is_some_and(|features| features.iter().any(|f| f == m.as_str()))
        })
        .collect()
}

/// Whether `module` is usable by this role under this plan
pub fn has_module(role: &str, plan_features: Option<&[String]>, module: Module) -> bool {
    effective_modules(role, plan_features).contains(&module)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_module() {
        for m in Module::ALL {
            assert_eq!(parse_module(m.as_str()), Some(*m));
        }
        assert_eq!(parse_module("kitchen"), None);
    }

    #[test]
    fn test_role_table() {
        assert_eq!(modules_for_role("owner").len(), Module::ALL.len());
        assert!(!modules_for_role("admin").contains(&Module::Billing));
        assert!(modules_for_role("admin").contains(&Module::Users));
        assert!(modules_for_role("manager").contains(&Module::Inventory));
        assert!(!modules_for_role("manager").contains(&Module::Users));
        assert_eq!(
            modules_for_role("staff"),
            &[
                Module::Dashboard,
                Module::Reservations,
                Module::Orders,
                Module::Tables
            ]
        );
        assert!(modules_for_role("waiter").is_empty());
        assert!(modules_for_role("").is_empty());
    }

    #[test]
    fn test_effective_without_subscription() {
        let mods = effective_modules("owner", None);
        assert_eq!(
            mods,
            vec![
                Module::Dashboard,
                Module::Support,
                Module::Settings,
                Module::Billing
            ]
        );
    }

    #[test]
    fn test_effective_intersection() {
        let plan = features(&["reservations", "menu", "blog", "not-a-module"]);
        let mods = effective_modules("manager", Some(&plan));
        assert!(mods.contains(&Module::Reservations));
        assert!(mods.contains(&Module::Menu));
        // manager role has no blog access even if the plan does
        assert!(!mods.contains(&Module::Blog));
        // plan lacks inventory
        assert!(!mods.contains(&Module::Inventory));
        // always-on survives for roles that have it
        assert!(mods.contains(&Module::Dashboard));
        assert!(!mods.contains(&Module::Billing));
    }

    #[test]
    fn test_has_module() {
        let plan = features(&["orders"]);
        assert!(has_module("staff", Some(&plan), Module::Orders));
        assert!(!has_module("staff", Some(&plan), Module::Reservations));
        assert!(!has_module("unknown", Some(&plan), Module::Dashboard));
        assert!(has_module("owner", None, Module::Billing));
    }

    #[test]
    fn test_role_round_trip() {
        for r in [
            Role::Owner,
            Role::Admin,
            Role::Manager,
            Role::Staff,
            Role::PlatformAdmin,
        ] {
            assert_eq!(Role::from_db(r.as_db()), Some(r));
        }
        assert!(Role::Staff.is_assignable());
        assert!(!Role::Owner.is_assignable());
        assert!(!Role::PlatformAdmin.is_assignable());
    }
}
