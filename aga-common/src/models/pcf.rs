//! APQC Process Classification Framework, level 1

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PcfCategoryType {
    Operating,
    ManagementSupport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PcfCategory {
    pub pcf_id: &'static str,
    pub name: &'static str,
    pub level: u8,
    #[serde(rename = "type")]
    pub category_type: PcfCategoryType,
}

const fn level1(pcf_id: &'static str, name: &'static str, category_type: PcfCategoryType) -> PcfCategory {
    PcfCategory {
        pcf_id,
        name,
        level: 1,
        category_type,
    }
}

/// The thirteen level-1 categories
pub const APQC_PCF_LEVEL1: [PcfCategory; 13] = [
    level1("1.0", "Develop Vision and Strategy", PcfCategoryType::Operating),
    level1("2.0", "Develop and Manage Products and Services", PcfCategoryType::Operating),
    level1("3.0", "Market and Sell Products and Services", PcfCategoryType::Operating),
    level1("4.0", "Deliver Products and Services", PcfCategoryType::Operating),
    level1("5.0", "Manage Customer Service", PcfCategoryType::Operating),
    level1("6.0", "Develop and Manage Human Capital", PcfCategoryType::ManagementSupport),
    level1("7.0", "Manage Information Technology", PcfCategoryType::ManagementSupport),
    level1("8.0", "Manage Financial Resources", PcfCategoryType::ManagementSupport),
    level1("9.0", "Acquire, Construct, and Manage Assets", PcfCategoryType::ManagementSupport),
    level1(
        "10.0",
        "Manage Enterprise Risk, Compliance, Remediation, and Resiliency",
        PcfCategoryType::ManagementSupport,
    ),
    level1("11.0", "Manage External Relationships", PcfCategoryType::ManagementSupport),
    level1("12.0", "Develop and Manage Business Capabilities", PcfCategoryType::ManagementSupport),
    level1("13.0", "Manage Knowledge, Improvement, and Change", PcfCategoryType::ManagementSupport),
];

/// Look up a level-1 category by its PCF id
pub fn find_pcf_category(pcf_id: &str) -> Option<&'static PcfCategory> {
    APQC_PCF_LEVEL1.iter().find(|c| c.pcf_id == pcf_id)
}

/// Leading category number of a PCF id ("7.3.1" -> 7); 0 when there is none
pub fn pcf_category_number(pcf_id: &str) -> u32 {
    let digits: String = pcf_id.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}
