use super::{RUPEE, empty_state, escape_html, format_date, format_inr};
use crate::models::{BankDetails, MonthlyEarning, Transaction, WalletStats};

pub fn balance_cards(stats: &WalletStats) -> String {
    let pending_events = if stats.pending_count == 1 { "event" } else { "events" };
    format!(
        concat!(
            r#"<div class="wallet-card balance"><h4>Available Balance</h4><p class="amount">{rupee}{available}</p></div>"#,
            r#"<div class="wallet-card pending"><h4>Pending</h4><p class="amount">{rupee}{pending}</p><p class="meta">{pending_count} {pending_events}</p></div>"#,
            r#"<div class="wallet-card earned"><h4>Total Earned</h4><p class="amount">{rupee}{earned}</p><p class="meta">{events} events completed</p></div>"#
        ),
        rupee = RUPEE,
        available = format_inr(&stats.available_balance),
        pending = format_inr(&stats.pending_amount),
        pending_count = stats.pending_count,
        pending_events = pending_events,
        earned = format_inr(&stats.total_earned),
        events = stats.total_events,
    )
}

fn bar_label(amount: f64) -> String {
    if amount >= 1000.0 {
        let thousands = amount / 1000.0;
        if thousands.fract() == 0.0 {
            format!("{RUPEE}{thousands:.0}k")
        } else {
            format!("{RUPEE}{thousands:.1}k")
        }
    } else {
        format!("{RUPEE}{amount:.0}")
    }
}

/// Bar heights are percentages of the best month.
pub fn earnings_chart(months: &[MonthlyEarning]) -> String {
    if months.is_empty() {
        return empty_state("No earnings data available");
    }
    let amounts: Vec<f64> = months
        .iter()
        .map(|m| m.amount.trim().parse::<f64>().unwrap_or(0.0).max(0.0))
        .collect();
    let max = amounts.iter().copied().fold(0.0_f64, f64::max);

    let bars: String = months
        .iter()
        .zip(&amounts)
        .map(|(month, &amount)| {
            let height = if max > 0.0 { amount / max * 100.0 } else { 0.0 };
            format!(
                r#"<div class="chart-bar" style="height: {height:.0}%"><span class="bar-value">{}</span><span class="bar-label">{}</span></div>"#,
                bar_label(amount),
                escape_html(&month.month),
            )
        })
        .collect();
    format!(r#"<div class="chart-bars">{bars}</div>"#)
}

/// Rows for the transactions `<tbody>`; the empty case is a full-width row.
pub fn transactions_table(transactions: &[Transaction]) -> String {
    if transactions.is_empty() {
        return r#"<tr><td colspan="5" class="empty-state">No transactions found</td></tr>"#.to_string();
    }
    transactions
        .iter()
        .map(|tx| {
            let (status_class, status) = if tx.status == "completed" {
                ("completed", "Paid")
            } else {
                ("pending", "Pending")
            };
            let event = if tx.event_title.trim().is_empty() { "Payment" } else { tx.event_title.as_str() };
            let organizer = if tx.organizer_name.trim().is_empty() { "-" } else { tx.organizer_name.as_str() };
            format!(
                concat!(
                    "<tr><td>{date}</td><td>{event}</td><td>{organizer}</td>",
                    r#"<td class="amount">{rupee}{amount}</td>"#,
                    r#"<td><span class="status-badge {status_class}">{status}</span></td></tr>"#
                ),
                date = format_date(tx.created_at.as_deref()),
                event = escape_html(event),
                organizer = escape_html(organizer),
                rupee = RUPEE,
                amount = format_inr(&tx.amount),
                status_class = status_class,
                status = status,
            )
        })
        .collect()
}

/// Account numbers are shown with everything but the last four digits masked.
pub fn mask_account_number(number: &str) -> String {
    let digits: Vec<char> = number.trim().chars().collect();
    if digits.len() <= 4 {
        return digits.into_iter().collect();
    }
    let visible: String = digits[digits.len() - 4..].iter().collect();
    format!("{}{visible}", "X".repeat(digits.len() - 4))
}

pub fn bank_details(details: &BankDetails) -> String {
    if !details.is_complete() {
        return empty_state("No bank account added yet. Add your bank details to withdraw funds.");
    }
    let bank = if details.bank_name.trim().is_empty() { "N/A" } else { details.bank_name.as_str() };
    format!(
        concat!(
            r#"<div class="bank-details">"#,
            r#"<div class="detail-item"><span class="label">Account Holder</span><span class="value">{holder}</span></div>"#,
            r#"<div class="detail-item"><span class="label">Account Number</span><span class="value">{number}</span></div>"#,
            r#"<div class="detail-item"><span class="label">IFSC Code</span><span class="value">{ifsc}</span></div>"#,
            r#"<div class="detail-item"><span class="label">Bank</span><span class="value">{bank}</span></div>"#,
            "</div>"
        ),
        holder = escape_html(&details.account_holder),
        number = escape_html(&mask_account_number(&details.account_number)),
        ifsc = escape_html(&details.ifsc_code),
        bank = escape_html(bank),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn month(name: &str, amount: &str) -> MonthlyEarning {
        MonthlyEarning {
            month: name.into(),
            amount: amount.into(),
        }
    }

    #[test]
    fn test_balance_cards_use_indian_grouping() {
        let stats = WalletStats {
            available_balance: "125000.00".into(),
            pending_amount: "3500".into(),
            pending_count: 1,
            total_earned: "250000".into(),
            total_events: 14,
            ..Default::default()
        };
        let html = balance_cards(&stats);
        assert!(html.contains("₹1,25,000"));
        assert!(html.contains("1 event</p>"));
        assert!(html.contains("₹2,50,000"));
        assert!(html.contains("14 events completed"));
    }

    #[test]
    fn test_earnings_chart_scales_to_best_month() {
        let html = earnings_chart(&[month("Jan", "4000"), month("Feb", "800"), month("Mar", "2500")]);
        assert!(html.contains(r#"style="height: 100%"><span class="bar-value">₹4k</span>"#));
        assert!(html.contains(r#"style="height: 20%"><span class="bar-value">₹800</span>"#));
        assert!(html.contains("₹2.5k"));
        assert!(earnings_chart(&[]).contains("No earnings data available"));
    }

    #[test]
    fn test_earnings_chart_all_zero() {
        let html = earnings_chart(&[month("Jan", "0")]);
        assert!(html.contains("height: 0%"));
    }

    #[test]
    fn test_transactions_table_rows() {
        let txs = vec![
            Transaction {
                id: 1,
                amount: "2500.00".into(),
                status: "completed".into(),
                event_title: "Sangeet".into(),
                organizer_name: "Shaadi Co".into(),
                created_at: Some("2025-02-10T09:00:00Z".into()),
                ..Default::default()
            },
            Transaction {
                id: 2,
                amount: "500".into(),
                status: "pending".into(),
                ..Default::default()
            },
        ];
        let html = transactions_table(&txs);
        assert_eq!(html.matches("<tr>").count(), 2);
        assert!(html.contains("<td>10 Feb 2025</td><td>Sangeet</td><td>Shaadi Co</td>"));
        assert!(html.contains("<td>N/A</td><td>Payment</td><td>-</td>"));
        assert!(html.contains(">Paid</span>"));
        assert!(html.contains(">Pending</span>"));
        assert_eq!(html, transactions_table(&txs));
        assert_eq!(
            transactions_table(&[]),
            r#"<tr><td colspan="5" class="empty-state">No transactions found</td></tr>"#
        );
    }

    #[test]
    fn test_bank_details_masks_account_number() {
        assert_eq!(mask_account_number("123456789012"), "XXXXXXXX9012");
        assert_eq!(mask_account_number("123"), "123");
        let details = BankDetails {
            account_holder: "Asha Rao".into(),
            account_number: "123456789012".into(),
            ifsc_code: "HDFC0001234".into(),
            ..Default::default()
        };
        let html = bank_details(&details);
        assert!(html.contains("XXXXXXXX9012"));
        assert!(!html.contains("123456789012"));
        assert!(bank_details(&BankDetails::default()).contains("empty-state"));
    }
}
