//! Server-rendered portfolio page.

use crate::models::PortfolioSummary;

pub fn render(summary: &PortfolioSummary, running: bool) -> String {
    let rows: String = summary
        .holdings
        .iter()
        .map(|line| {
            let buy_price = line
                .average_buy_price
                .map(|p| format!("{:.2}", p))
                .unwrap_or_else(|| "-".to_string());
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{:.2}</td><td>{:.2}</td></tr>\n",
                line.name, line.symbol, line.ticker, line.quantity, buy_price, line.current_price, line.value
            )
        })
        .collect();

    let mut trades: String = summary
        .recent_trades
        .iter()
        .map(|trade| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{:.2}</td><td>{}</td></tr>\n",
                trade.timestamp.format("%Y-%m-%d %H:%M:%S"),
                trade.side,
                trade.symbol,
                trade.price,
                trade.quantity
            )
        })
        .collect();
    if trades.is_empty() {
        trades.push_str("<tr><td colspan=\"5\">No trades yet</td></tr>");
    }

    let (status, toggle) = if running {
        ("Running", "<a href=\"/stop\">Stop auto-trading</a>")
    } else {
        ("Stopped", "<a href=\"/start\">Start auto-trading</a>")
    };
    let profit_class = if summary.profit.is_sign_negative() { "loss" } else { "gain" };

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Mock Auto-Trader</title>
<style>
body {{ font-family: sans-serif; margin: 2em; }}
table {{ border-collapse: collapse; margin-bottom: 1.5em; }}
td, th {{ border: 1px solid #ccc; padding: 4px 10px; text-align: right; }}
.gain {{ color: #c0392b; }}
.loss {{ color: #2456c9; }}
</style>
</head>
<body>
<h1>Mock Auto-Trader</h1>
<p>Status: <strong>{status}</strong> &middot; {toggle}</p>
<table>
<tr><th>Seed</th><td>{seed:.2}</td></tr>
<tr><th>Cash</th><td>{cash:.2}</td></tr>
<tr><th>Total Asset</th><td>{total:.2}</td></tr>
<tr><th>Profit</th><td class="{profit_class}">{profit:.2} ({profit_pct:.2}%)</td></tr>
</table>
<h2>Holdings</h2>
<table>
<tr><th>Name</th><th>Symbol</th><th>Ticker</th><th>Quantity</th><th>Buy Price</th><th>Price</th><th>Value</th></tr>
{rows}
</table>
<h2>Recent Trades ({trade_count} total)</h2>
<table>
<tr><th>Time (UTC)</th><th>Side</th><th>Symbol</th><th>Price</th><th>Quantity</th></tr>
{trades}
</table>
</body>
</html>
"#,
        seed = summary.seed_cash,
        cash = summary.cash,
        total = summary.total_asset,
        profit = summary.profit,
        profit_pct = summary.profit_pct,
        trade_count = summary.trade_count,
    )
}
