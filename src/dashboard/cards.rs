//! Cards with the totals of a user's transactions.

use maud::{Markup, html};

use crate::{
    html::{format_currency, format_percentage},
    transaction::Summary,
};

/// One card per total: income, expenses, balance and expenses as a share of income.
pub(super) fn summary_cards(summary: &Summary) -> Markup {
    let balance_style = if summary.balance < 0.0 {
        "text-red-600 dark:text-red-400"
    } else {
        "text-gray-900 dark:text-white"
    };

    html! {
        section
            id="summary"
            class="w-full grid grid-cols-2 lg:grid-cols-4 gap-4 mb-8"
        {
            (summary_card("income", "Income", &format_currency(summary.income), "text-green-600 dark:text-green-400"))
            (summary_card("expenses", "Expenses", &format_currency(summary.expenses), "text-red-600 dark:text-red-400"))
            (summary_card("balance", "Balance", &format_currency(summary.balance), balance_style))
            (summary_card("expense-percentage", "Expenses / Income", &format_percentage(summary.expense_percentage), "text-gray-900 dark:text-white"))
        }
    }
}

fn summary_card(name: &str, title: &str, value: &str, value_style: &str) -> Markup {
    html! {
        div
            data-summary=(name)
            class="bg-white dark:bg-gray-800 border border-gray-200
                dark:border-gray-700 rounded-lg p-4 shadow-md"
        {
            h3 class="text-sm font-medium text-gray-600 dark:text-gray-400" { (title) }
            p class={ "text-2xl font-bold " (value_style) } { (value) }
        }
    }
}
