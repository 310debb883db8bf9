use std::sync::Arc;

use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use frame_adapter::{CellValue, DataFrameModel, FrameIndex};

/// Deterministic splitmix64 stream, so every run writes the same sample.
struct SampleRng(u64);

impl SampleRng {
    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform in `[0, 1)`.
    fn unit(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, bound: u64) -> u64 {
        self.next_u64() % bound
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[self.below(items.len() as u64) as usize]
    }
}

struct SampleRow {
    supplier: String,
    quarter: i64,
    exposure: f64,
    incidents: i64,
    status: Option<&'static str>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let mut rng = SampleRng(42);

    let suppliers = ["Acme GmbH", "Borealis \"North\" Ltd", "Cobalt, Inc."];
    let statuses = ["open", "under review", "closed"];

    let mut rows = Vec::new();
    for supplier in suppliers {
        for quarter in 1..=4 {
            let exposure = (rng.unit() * 250_000.0 * 100.0).round() / 100.0;
            let incidents = rng.below(12) as i64;
            // every fifth row has no status
            let status = (rows.len() % 5 != 4).then(|| rng.pick(&statuses));
            rows.push(SampleRow {
                supplier: supplier.to_string(),
                quarter,
                exposure,
                incidents,
                status,
            });
        }
    }

    // JSON wire shape with a two-level index; exposure uses a decimal comma.
    let model = DataFrameModel {
        columns: Some(vec!["exposure".into(), "incidents".into(), "status".into()]),
        data: Some(
            rows.iter()
                .map(|r| {
                    vec![
                        CellValue::String(format!("{:.2}", r.exposure).replace('.', ",")),
                        CellValue::Integer(r.incidents),
                        CellValue::from(r.status),
                    ]
                })
                .collect(),
        ),
        index: FrameIndex::Multi(
            rows.iter()
                .map(|r| vec![CellValue::String(r.supplier.clone()), CellValue::Integer(r.quarter)])
                .collect(),
        ),
        index_names: Some(vec![Some("supplier".into()), Some("quarter".into())]),
    };
    let json_path = "sample_frame.json";
    std::fs::write(json_path, serde_json::to_string_pretty(&model)?)?;
    log::info!("wrote {json_path}");

    // Parquet with a pandas-style unnamed index column.
    let schema = Arc::new(Schema::new(vec![
        Field::new("__index_level_0__", DataType::Utf8, false),
        Field::new("quarter", DataType::Int64, false),
        Field::new("exposure", DataType::Float64, false),
        Field::new("incidents", DataType::Int64, false),
        Field::new("status", DataType::Utf8, true),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(
                rows.iter().map(|r| r.supplier.as_str()).collect::<Vec<_>>(),
            )),
            Arc::new(Int64Array::from(rows.iter().map(|r| r.quarter).collect::<Vec<_>>())),
            Arc::new(Float64Array::from(rows.iter().map(|r| r.exposure).collect::<Vec<_>>())),
            Arc::new(Int64Array::from(rows.iter().map(|r| r.incidents).collect::<Vec<_>>())),
            Arc::new(StringArray::from(rows.iter().map(|r| r.status).collect::<Vec<_>>())),
        ],
    )?;

    let parquet_path = "sample_frame.parquet";
    let file = std::fs::File::create(parquet_path)?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    log::info!("wrote {parquet_path}");

    println!("Wrote {} rows to {json_path} and {parquet_path}", rows.len());
    Ok(())
}
