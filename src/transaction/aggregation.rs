//! Totals derived from a set of transactions.

use serde::Serialize;

use crate::transaction::{Transaction, TransactionType};

/// Income, expenses and what is left over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// The sum of all income.
    pub income: f64,
    /// The sum of the magnitudes of all expenses.
    pub expenses: f64,
    /// `income - expenses`.
    pub balance: f64,
    /// Expenses as a percentage of income, zero when there is no income.
    pub expense_percentage: f64,
}

/// Fold `transactions` into a [Summary].
///
/// The result only depends on the set of transactions, not their order.
pub fn summarize(transactions: &[Transaction]) -> Summary {
    let (income, expenses) =
        transactions
            .iter()
            .fold((0.0, 0.0), |(income, expenses), transaction| match transaction.kind {
                TransactionType::Income => (income + transaction.amount, expenses),
                TransactionType::Expense => (income, expenses + transaction.amount.abs()),
            });

    let expense_percentage = if income > 0.0 {
        expenses / income * 100.0
    } else {
        0.0
    };

    Summary {
        income,
        expenses,
        balance: income - expenses,
        expense_percentage,
    }
}

/// The size of `amount` as a percentage of `total_income`.
///
/// Returns `None` when there is no income to compare against.
pub fn share_of_income(amount: f64, total_income: f64) -> Option<f64> {
    if total_income > 0.0 {
        Some(amount.abs() / total_income * 100.0)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use crate::{
        UserId,
        transaction::{Category, Transaction, TransactionId, TransactionType},
    };

    use super::{Summary, share_of_income, summarize};

    fn transaction(id: i64, amount: f64, kind: TransactionType, category: &str) -> Transaction {
        Transaction {
            id: TransactionId::new(id),
            amount,
            kind,
            category: Category::new(category).unwrap(),
            description: None,
            date: datetime!(2024-01-01 00:00 UTC),
            user_id: UserId::new(1),
        }
    }

    #[test]
    fn summarizes_income_and_expenses() {
        let transactions = [
            transaction(1, -50.0, TransactionType::Expense, "Food"),
            transaction(2, 1000.0, TransactionType::Income, "Income"),
        ];

        let summary = summarize(&transactions);

        assert_eq!(
            summary,
            Summary {
                income: 1000.0,
                expenses: 50.0,
                balance: 950.0,
                expense_percentage: 5.0,
            }
        );
    }

    #[test]
    fn empty_set_is_all_zero() {
        assert_eq!(summarize(&[]), Summary::default());
    }

    #[test]
    fn no_income_means_zero_percentage() {
        let transactions = [
            transaction(1, -20.0, TransactionType::Expense, "Food"),
            transaction(2, -5.0, TransactionType::Expense, "Transport"),
        ];

        let summary = summarize(&transactions);

        assert_eq!(summary.expense_percentage, 0.0);
        assert_eq!(summary.expenses, 25.0);
        assert_eq!(summary.balance, -25.0);
    }

    #[test]
    fn balance_is_income_minus_expenses_for_any_mix() {
        let amounts = [12.5, -3.25, 400.0, -0.01, 0.0, -99.99, 7.0];

        for end in 0..=amounts.len() {
            let transactions = amounts[..end]
                .iter()
                .enumerate()
                .map(|(i, &amount)| {
                    let kind = TransactionType::from_amount(amount);
                    transaction(i as i64, amount, kind, "Other")
                })
                .collect::<Vec<_>>();

            let summary = summarize(&transactions);

            assert_eq!(summary.balance, summary.income - summary.expenses);
            assert!(summary.expenses >= 0.0);
        }
    }

    #[test]
    fn order_does_not_matter() {
        let mut transactions = vec![
            transaction(1, -50.0, TransactionType::Expense, "Food"),
            transaction(2, 1000.0, TransactionType::Income, "Income"),
            transaction(3, -25.0, TransactionType::Expense, "Shopping"),
        ];
        let forwards = summarize(&transactions);

        transactions.reverse();

        assert_eq!(summarize(&transactions), forwards);
    }

    #[test]
    fn share_of_income_is_omitted_without_income() {
        assert_eq!(share_of_income(-50.0, 1000.0), Some(5.0));
        assert_eq!(share_of_income(-50.0, 0.0), None);
    }
}
