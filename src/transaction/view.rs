//! HTML rendering for transaction cards in view and edit mode, and the form
//! for adding a transaction.

use maud::{Markup, html};
use time::{OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description};
use unicode_segmentation::UnicodeSegmentation;

use crate::{
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, BUTTON_SECONDARY_STYLE, FORM_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, LINK_STYLE, format_currency, format_percentage, loading_spinner,
    },
    transaction::{
        Draft, EXPENSE_CATEGORIES, Transaction, TransactionId, TransactionType, ValidationError,
        share_of_income,
    },
};

/// The max number of graphemes to display in a card before truncating and
/// displaying ellipses.
const MAX_DESCRIPTION_GRAPHEMES: usize = 48;

const CARD_DATE_FORMAT: &[BorrowedFormatItem] =
    format_description!("[day] [month repr:short] [year], [hour]:[minute]");

const DELETE_CONFIRM_MESSAGE: &str = "Are you sure you want to delete this transaction?";

/// The HTML ID of the card for the transaction `id`.
pub(crate) fn card_id(id: TransactionId) -> String {
    format!("transaction-{id}")
}

fn card_style(kind: TransactionType) -> &'static str {
    match kind {
        TransactionType::Income => "p-4 rounded-lg bg-green-50 dark:bg-green-900/20",
        TransactionType::Expense => "p-4 rounded-lg bg-red-50 dark:bg-red-900/20",
    }
}

fn amount_class(kind: TransactionType) -> &'static str {
    match kind {
        TransactionType::Income => "font-bold text-green-600 dark:text-green-400",
        TransactionType::Expense => "font-bold text-red-600 dark:text-red-400",
    }
}

fn truncate_description(description: &str) -> (String, Option<&str>) {
    let description_length = description.graphemes(true).count();

    if description_length <= MAX_DESCRIPTION_GRAPHEMES {
        return (description.to_owned(), None);
    }

    let mut truncated: String = description
        .graphemes(true)
        .take(MAX_DESCRIPTION_GRAPHEMES - 1)
        .collect();
    truncated.push('…');

    (truncated, Some(description))
}

fn format_date(date: OffsetDateTime) -> String {
    date.format(CARD_DATE_FORMAT).unwrap_or_else(|error| {
        tracing::error!("could not format transaction date {date}: {error}");
        date.date().to_string()
    })
}

/// A transaction in view mode.
///
/// Expenses show their share of `total_income` unless there is no income.
pub fn transaction_card(transaction: &Transaction, total_income: f64) -> Markup {
    let id = card_id(transaction.id);
    let target = format!("#{id}");
    let edit_url = format_endpoint(endpoints::EDIT_TRANSACTION_VIEW, transaction.id.as_i64());
    let delete_url = format!(
        "{}?confirmed=true",
        format_endpoint(endpoints::TRANSACTION, transaction.id.as_i64())
    );
    let share = match transaction.kind {
        TransactionType::Expense => share_of_income(transaction.amount, total_income),
        TransactionType::Income => None,
    };

    html! {
        div id=(id) class=(card_style(transaction.kind)) data-transaction-card="true"
        {
            div class="flex justify-between items-center gap-4"
            {
                div class="min-w-0"
                {
                    p class="font-medium" { (transaction.category) }

                    @if let Some(description) = &transaction.description {
                        @let (text, tooltip) = truncate_description(description);
                        p class="text-sm text-gray-600 dark:text-gray-300" title=[tooltip] { (text) }
                    }

                    p class="text-sm text-gray-500 dark:text-gray-400"
                    {
                        time datetime=(transaction.date.date().to_string()) { (format_date(transaction.date)) }
                    }
                }

                div class="flex items-center gap-4"
                {
                    div class="text-right"
                    {
                        p class=(amount_class(transaction.kind)) { (format_currency(transaction.amount.abs())) }

                        @if let Some(share) = share {
                            p class="text-sm text-gray-500 dark:text-gray-400" data-share-of-income="true"
                            {
                                (format_percentage(share)) " of income"
                            }
                        }
                    }

                    div class="flex gap-3 text-sm"
                    {
                        button
                            type="button"
                            class=(LINK_STYLE)
                            hx-get=(edit_url)
                            hx-target=(target)
                            hx-swap="outerHTML"
                            hx-target-error="#alert-container"
                        {
                            "Edit"
                        }

                        button
                            type="button"
                            class=(BUTTON_DELETE_STYLE)
                            hx-delete=(delete_url)
                            hx-confirm=(DELETE_CONFIRM_MESSAGE)
                            hx-target=(target)
                            hx-swap="outerHTML"
                            hx-target-error="#alert-container"
                        {
                            "Delete"
                        }
                    }
                }
            }
        }
    }
}

/// A transaction in edit mode, showing the draft values and any validation error.
pub fn edit_transaction_card(
    id: TransactionId,
    kind: TransactionType,
    draft: &Draft,
    error: Option<&ValidationError>,
) -> Markup {
    let card_id = card_id(id);
    let target = format!("#{card_id}");
    let save_url = format_endpoint(endpoints::TRANSACTION, id.as_i64());
    let cancel_url = format_endpoint(endpoints::TRANSACTION_VIEW, id.as_i64());
    let error_for = |field: &str| error.filter(|error| error.field() == field);

    html! {
        form
            id=(card_id)
            class=(card_style(kind))
            data-transaction-card="true"
            hx-put=(save_url)
            hx-target=(target)
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
        {
            div class="flex flex-col gap-3"
            {
                div class="flex gap-2"
                {
                    div class="flex-1"
                    {
                        input
                            type="number"
                            name="amount"
                            aria-label="Amount"
                            class=(FORM_TEXT_INPUT_STYLE)
                            value=(draft.amount)
                            min="0"
                            step="any"
                            required;

                        @if let Some(error) = error_for("amount") {
                            p class="text-red-500 text-sm" { (error) }
                        }
                    }

                    @match kind {
                        TransactionType::Expense => {
                            div class="flex-1"
                            {
                                (category_select(&draft.category))

                                @if let Some(error) = error_for("category") {
                                    p class="text-red-500 text-sm" { (error) }
                                }
                            }
                        }
                        TransactionType::Income => {
                            input type="hidden" name="category" value=(draft.category);
                        }
                    }
                }

                input
                    type="text"
                    name="description"
                    aria-label="Description"
                    placeholder="Description (optional)"
                    class=(FORM_TEXT_INPUT_STYLE)
                    value=(draft.description);

                div class="flex justify-end gap-2"
                {
                    button type="submit" class=(BUTTON_SECONDARY_STYLE) { "Save" }

                    button
                        type="button"
                        class=(BUTTON_SECONDARY_STYLE)
                        hx-get=(cancel_url)
                        hx-target=(target)
                        hx-swap="outerHTML"
                    {
                        "Cancel"
                    }
                }
            }
        }
    }
}

/// A select with the expense categories. A `selected` label that is not in the
/// list, e.g. from an imported transaction, is kept as an extra option.
fn category_select(selected: &str) -> Markup {
    let is_custom = !selected.is_empty() && !EXPENSE_CATEGORIES.contains(&selected);

    html! {
        select name="category" aria-label="Category" class=(FORM_TEXT_INPUT_STYLE) required
        {
            @if is_custom {
                option value=(selected) selected { (selected) }
            }

            @for category in EXPENSE_CATEGORIES {
                option value=(category) selected[category == selected] { (category) }
            }
        }
    }
}

/// The values of the add transaction form.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransactionFormValues<'a> {
    /// The amount as typed.
    pub amount: &'a str,
    /// Whether the income or expense tab is selected.
    pub kind: TransactionType,
    /// The selected expense category.
    pub category: &'a str,
    /// The description as typed.
    pub description: &'a str,
}

impl Default for NewTransactionFormValues<'_> {
    fn default() -> Self {
        Self {
            amount: "",
            kind: TransactionType::Expense,
            category: EXPENSE_CATEGORIES[0],
            description: "",
        }
    }
}

/// The form for adding a transaction. Income is always filed under
/// [crate::transaction::Category::INCOME], so the category only applies to expenses.
pub fn new_transaction_form(
    values: &NewTransactionFormValues,
    error: Option<&ValidationError>,
) -> Markup {
    html! {
        form
            id="new-transaction-form"
            hx-post=(endpoints::TRANSACTIONS_API)
            hx-target="this"
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            hx-indicator="#new-transaction-indicator"
            class="bg-white dark:bg-gray-800 rounded-lg shadow p-6 space-y-4"
        {
            h2 class="text-xl font-bold" { "Add Transaction" }

            div
            {
                label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }
                input
                    type="number"
                    name="amount"
                    id="amount"
                    min="0"
                    step="any"
                    placeholder="0.00"
                    class=(FORM_TEXT_INPUT_STYLE)
                    value=(values.amount)
                    required;
            }

            div
            {
                label for="type" class=(FORM_LABEL_STYLE) { "Type" }
                select name="type" id="type" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="expense" selected[values.kind == TransactionType::Expense] { "Expense" }
                    option value="income" selected[values.kind == TransactionType::Income] { "Income" }
                }
            }

            div
            {
                label for="category" class=(FORM_LABEL_STYLE) { "Category (expenses only)" }
                select name="category" id="category" class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for category in EXPENSE_CATEGORIES {
                        option value=(category) selected[category == values.category] { (category) }
                    }
                }
            }

            div
            {
                label for="description" class=(FORM_LABEL_STYLE) { "Description" }
                input
                    type="text"
                    name="description"
                    id="description"
                    placeholder="Optional"
                    class=(FORM_TEXT_INPUT_STYLE)
                    value=(values.description);
            }

            @if let Some(error) = error {
                p class="text-red-500 text-base" { (error) }
            }

            button type="submit" id="new-transaction-indicator" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" { (loading_spinner()) }
                "Add Transaction"
            }
        }
    }
}

/// A titled list of transaction cards, e.g. "Expenses".
pub fn transaction_list(
    title: &str,
    transactions: &[&Transaction],
    total_income: f64,
) -> Markup {
    html! {
        section class="bg-white dark:bg-gray-800 rounded-lg shadow p-6"
        {
            h2 class="text-2xl font-bold mb-4" { (title) }

            div class="space-y-4"
            {
                @for transaction in transactions {
                    (transaction_card(transaction, total_income))
                }

                @if transactions.is_empty() {
                    p class="text-sm text-gray-500 dark:text-gray-400" { "Nothing here yet." }
                }
            }
        }
    }
}
