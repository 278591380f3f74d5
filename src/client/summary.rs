//! Client-side filtering and totals over a list of expenses.
//!
//! Period totals use Sunday-start weeks and calendar months, both within
//! the calendar year of `today`. Dates come from the date part of
//! `createdAt`; expenses without a readable date count toward `total` and
//! `by_category` only.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, Weekday};

use super::Expense;

/// Filter applied before summarizing. Dates are inclusive `YYYY-MM-DD`
/// bounds compared against the date part of `createdAt`.
#[derive(Debug, Clone, Default)]
pub struct ExpenseFilter {
    pub category: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl ExpenseFilter {
    pub fn matches(&self, expense: &Expense) -> bool {
        if let Some(category) = &self.category {
            if &expense.category != category {
                return false;
            }
        }
        if self.start_date.is_none() && self.end_date.is_none() {
            return true;
        }

        // Undated expenses only pass an unbounded date range.
        let Some(day) = expense.created_at.as_deref().map(date_part) else {
            return false;
        };
        if let Some(start) = &self.start_date {
            if day < start.as_str() {
                return false;
            }
        }
        if let Some(end) = &self.end_date {
            if day > end.as_str() {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Summary {
    pub count: usize,
    pub total: f64,
    /// Expenses in the same Sunday-start week as `today`.
    pub week_total: f64,
    /// Expenses in the same calendar month as `today`.
    pub month_total: f64,
    pub by_category: BTreeMap<String, f64>,
    pub by_day: BTreeMap<NaiveDate, f64>,
}

impl Summary {
    /// Total rounded to cents.
    pub fn total_display(&self) -> String {
        format_amount(self.total)
    }
}

pub fn format_amount(amount: f64) -> String {
    format!("{:.2}", amount)
}

/// Summarize the expenses that pass `filter`, with period totals relative
/// to `today`.
pub fn summarize(expenses: &[Expense], filter: &ExpenseFilter, today: NaiveDate) -> Summary {
    let this_week = today.week(Weekday::Sun).first_day();

    expenses
        .iter()
        .filter(|e| filter.matches(e))
        .fold(Summary::default(), |mut summary, e| {
            summary.count += 1;
            summary.total += e.amount;
            *summary.by_category.entry(e.category.clone()).or_insert(0.0) += e.amount;

            if let Some(day) = expense_date(e) {
                *summary.by_day.entry(day).or_insert(0.0) += e.amount;
                if day.year() == today.year() {
                    if day.week(Weekday::Sun).first_day() == this_week {
                        summary.week_total += e.amount;
                    }
                    if day.month() == today.month() {
                        summary.month_total += e.amount;
                    }
                }
            }
            summary
        })
}

fn expense_date(expense: &Expense) -> Option<NaiveDate> {
    let day = date_part(expense.created_at.as_deref()?);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn date_part(timestamp: &str) -> &str {
    timestamp.get(..10).unwrap_or(timestamp)
}
