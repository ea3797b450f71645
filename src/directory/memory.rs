use std::collections::HashMap;

use crate::mock_data::Employee;

use super::full_name;

/// Full-name → head-count index over an in-process roster.
#[derive(Debug, Default)]
pub struct EmployeeIndex {
    by_name: HashMap<String, u64>,
    employees: usize,
}

impl EmployeeIndex {
    pub fn from_roster(roster: &[Employee]) -> Self {
        let mut by_name = HashMap::new();
        for employee in roster {
            *by_name
                .entry(full_name(&employee.first_name, &employee.last_name))
                .or_insert(0) += 1;
        }

        Self {
            by_name,
            employees: roster.len(),
        }
    }

    /// `key` is an already-normalised full name.
    pub fn count(&self, key: &str) -> u64 {
        self.by_name.get(key).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.employees
    }

    pub fn is_empty(&self) -> bool {
        self.employees == 0
    }
}
