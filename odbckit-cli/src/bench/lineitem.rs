//! The benchmark table and its row generator.
//!
//! The schema follows the TPC-H LINEITEM table so that numbers are roughly
//! comparable with other load tools. Rows come from a seeded PRNG, so two
//! runs at the same scale factor insert identical data.

use chrono::{Duration, NaiveDate};
use odbckit_core::{Dialect, OdbcArguments, SqlType};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

pub const TABLE: &str = "LINEITEM";

pub const COLUMNS: &[(&str, SqlType)] = &[
    ("L_ORDERKEY", SqlType::BigInt),
    ("L_PARTKEY", SqlType::BigInt),
    ("L_SUPPKEY", SqlType::BigInt),
    ("L_LINENUMBER", SqlType::Integer),
    (
        "L_QUANTITY",
        SqlType::Decimal {
            precision: 15,
            scale: 2,
        },
    ),
    (
        "L_EXTENDEDPRICE",
        SqlType::Decimal {
            precision: 15,
            scale: 2,
        },
    ),
    (
        "L_DISCOUNT",
        SqlType::Decimal {
            precision: 15,
            scale: 2,
        },
    ),
    (
        "L_TAX",
        SqlType::Decimal {
            precision: 15,
            scale: 2,
        },
    ),
    ("L_RETURNFLAG", SqlType::Char { length: 1 }),
    ("L_LINESTATUS", SqlType::Char { length: 1 }),
    ("L_SHIPDATE", SqlType::Date),
    ("L_COMMITDATE", SqlType::Date),
    ("L_RECEIPTDATE", SqlType::Date),
    ("L_SHIPINSTRUCT", SqlType::Char { length: 25 }),
    ("L_SHIPMODE", SqlType::Char { length: 10 }),
    ("L_COMMENT", SqlType::Varchar { length: 44 }),
];

const RETURN_FLAGS: [&str; 3] = ["A", "N", "R"];
const LINE_STATUS: [&str; 2] = ["O", "F"];
const SHIP_INSTRUCT: [&str; 4] = [
    "DELIVER IN PERSON",
    "COLLECT COD",
    "NONE",
    "TAKE BACK RETURN",
];
const SHIP_MODES: [&str; 7] = ["AIR", "FOB", "MAIL", "RAIL", "REG AIR", "SHIP", "TRUCK"];
const COMMENT_WORDS: [&str; 12] = [
    "furiously", "quickly", "final", "special", "pending", "ironic", "express", "regular",
    "deposits", "requests", "accounts", "packages",
];

const SEED: u64 = 42;

#[derive(Debug, Clone, PartialEq)]
pub struct Lineitem {
    orderkey: i64,
    partkey: i64,
    suppkey: i64,
    linenumber: i32,
    quantity: f64,
    extendedprice: f64,
    discount: f64,
    tax: f64,
    returnflag: &'static str,
    linestatus: &'static str,
    shipdate: NaiveDate,
    commitdate: NaiveDate,
    receiptdate: NaiveDate,
    shipinstruct: &'static str,
    shipmode: &'static str,
    comment: String,
}

impl Lineitem {
    /// Pushes one argument per entry of [`COLUMNS`], in column order.
    pub fn bind(&self, dialect: Dialect, args: &mut OdbcArguments) {
        args.add(self.orderkey);
        args.add(self.partkey);
        args.add(self.suppkey);
        args.add(self.linenumber);
        bind_decimal(dialect, args, self.quantity);
        bind_decimal(dialect, args, self.extendedprice);
        bind_decimal(dialect, args, self.discount);
        bind_decimal(dialect, args, self.tax);
        args.add(self.returnflag);
        args.add(self.linestatus);
        args.add(self.shipdate);
        args.add(self.commitdate);
        args.add(self.receiptdate);
        args.add(self.shipinstruct);
        args.add(self.shipmode);
        args.add(self.comment.as_str());
    }
}

fn bind_decimal(dialect: Dialect, args: &mut OdbcArguments, value: f64) {
    if dialect.binds_decimal_as_text() {
        args.add(format!("{:.2}", value));
    } else {
        args.add(value);
    }
}

/// Yields between one and seven lines per order, `scale_factor * 1_500_000`
/// orders in total (at least one).
pub struct LineitemGenerator {
    rng: Xoshiro256PlusPlus,
    order: i64,
    orders: i64,
    line: i64,
    lines_in_order: i64,
}

impl LineitemGenerator {
    pub fn new(scale_factor: f64) -> Self {
        LineitemGenerator {
            rng: Xoshiro256PlusPlus::seed_from_u64(SEED),
            order: 0,
            orders: ((scale_factor * 1_500_000.0).round() as i64).max(1),
            line: 0,
            lines_in_order: 0,
        }
    }

    fn make_row(&mut self) -> Lineitem {
        let quantity = f64::from(self.rng.gen_range(1..=50));
        let shipdate = base_date() + Duration::days(self.rng.gen_range(0..2_557i64));
        let word_count = self.rng.gen_range(2..=5);
        let mut comment = String::new();
        for word in 0..word_count {
            if word > 0 {
                comment.push(' ');
            }
            comment.push_str(COMMENT_WORDS[self.rng.gen_range(0..COMMENT_WORDS.len())]);
        }
        comment.truncate(44);

        Lineitem {
            orderkey: self.order,
            partkey: self.rng.gen_range(1..=200_000i64),
            suppkey: self.rng.gen_range(1..=10_000i64),
            linenumber: self.line as i32,
            quantity,
            extendedprice: round2(quantity * self.rng.gen_range(90.0..1_050.0)),
            discount: round2(self.rng.gen_range(0.0..=0.10)),
            tax: round2(self.rng.gen_range(0.0..=0.08)),
            returnflag: RETURN_FLAGS[self.rng.gen_range(0..RETURN_FLAGS.len())],
            linestatus: LINE_STATUS[self.rng.gen_range(0..LINE_STATUS.len())],
            shipdate,
            commitdate: shipdate + Duration::days(self.rng.gen_range(-30i64..=30)),
            receiptdate: shipdate + Duration::days(self.rng.gen_range(1..=30i64)),
            shipinstruct: SHIP_INSTRUCT[self.rng.gen_range(0..SHIP_INSTRUCT.len())],
            shipmode: SHIP_MODES[self.rng.gen_range(0..SHIP_MODES.len())],
            comment,
        }
    }
}

impl Iterator for LineitemGenerator {
    type Item = Lineitem;

    fn next(&mut self) -> Option<Lineitem> {
        if self.line >= self.lines_in_order {
            self.order += 1;
            if self.order > self.orders {
                return None;
            }
            self.line = 0;
            self.lines_in_order = self.rng.gen_range(1..=7);
        }
        self.line += 1;
        Some(self.make_row())
    }
}

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1992, 1, 1).expect("valid constant date")
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
