use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use chrono::{NaiveDate, Utc};
use pharmabill_catalog::{CatalogItem, CatalogItemDetails};
use pharmabill_core::{CatalogItemId, CounterpartyId, InvoiceId};
use pharmabill_invoicing::{InvoiceDraft, InvoiceTotals, LineEdit, LineTotals, calculate_item_totals};
use pharmabill_parties::{Counterparty, CounterpartyDetails};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn catalog_item(i: i64) -> CatalogItem {
    CatalogItem::create(
        CatalogItemId::new(),
        CatalogItemDetails {
            name: format!("Item {i}"),
            packing: "10 Tabs".to_string(),
            batch_no: format!("B{i}"),
            expiry: "12/27".to_string(),
            hsn: "3004".to_string(),
            rate: Decimal::new(1_000 + i * 37, 2),
            gst_percent: dec!(12),
            stock: 1_000,
            ..CatalogItemDetails::default()
        },
    )
    .unwrap()
}

fn line_totals(count: i64) -> Vec<LineTotals> {
    (0..count)
        .map(|i| {
            calculate_item_totals(
                Decimal::new(1_000 + i * 37, 2),
                1 + i % 25,
                dec!(12),
                Decimal::new(i % 1_000, 2),
            )
        })
        .collect()
}

fn bench_line_calculation(c: &mut Criterion) {
    c.bench_function("calculate_item_totals", |b| {
        b.iter(|| {
            calculate_item_totals(
                black_box(dec!(33.45)),
                black_box(17),
                black_box(dec!(12)),
                black_box(dec!(7.5)),
            )
        });
    });
}

fn bench_aggregation(c: &mut Criterion) {
    let mut group = c.benchmark_group("invoice_aggregation");

    for line_count in [1, 10, 100, 1000].iter() {
        let lines = line_totals(*line_count);
        group.throughput(Throughput::Elements(*line_count as u64));
        group.bench_with_input(BenchmarkId::new("aggregate", line_count), &lines, |b, lines| {
            b.iter(|| InvoiceTotals::aggregate(black_box(lines)));
        });
    }

    group.finish();
}

fn bench_draft_to_invoice(c: &mut Criterion) {
    let items: Vec<CatalogItem> = (0..50).map(catalog_item).collect();
    let party = Counterparty::create(
        CounterpartyId::new(),
        CounterpartyDetails {
            name: "Bench Medicals".to_string(),
            address: "Bench Road".to_string(),
            mobile: "9000000000".to_string(),
            ..CounterpartyDetails::default()
        },
    )
    .unwrap();
    let date = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();

    c.bench_function("draft_fifty_lines_and_finalize", |b| {
        b.iter(|| {
            let mut draft = InvoiceDraft::new("INV-2504-001", date);
            draft.select_counterparty(party.clone());
            for item in &items {
                let i = draft.add_item(item);
                draft.update_line(i, LineEdit::Qty(3)).unwrap();
                draft.update_line(i, LineEdit::DiscountPercent(dec!(5))).unwrap();
            }
            draft.finalize(InvoiceId::new(), Utc::now()).unwrap()
        });
    });
}

criterion_group!(
    benches,
    bench_line_calculation,
    bench_aggregation,
    bench_draft_to_invoice
);
criterion_main!(benches);
