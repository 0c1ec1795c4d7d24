//! Built-in reference tables
//!
//! Measured chunk sizes and rates for the standard analysis samples. Run
//! configuration can overlay these per job type.

use once_cell::sync::Lazy;

use crate::table::{JobTypeTable, TableEntry};

/// Track-mover chunks `(events_per, files_per)`; exhaustive for its job type
pub static TRACKMOVER: Lazy<JobTypeTable> = Lazy::new(|| {
    [
        ("JetHT2015C", 200_000, 33),
        ("JetHT2015D", 665_202, 29),
        ("JetHT2016B3", 288_462, 17),
        ("JetHT2016C", 111_940, 8),
        ("JetHT2016D", 245_902, 17),
        ("JetHT2016E", 157_895, 12),
        ("JetHT2016F", 104_167, 9),
        ("JetHT2016G", 232_826, 19),
        ("JetHT2016H2", 202_703, 16),
        ("JetHT2016H3", 319_149, 25),
        ("qcdht0500", 1_657_600, 200),
        ("qcdht0500_2015", 4_762_566, 333),
        ("qcdht0500ext", 1_753_088, 214),
        ("qcdht0500ext_2015", 4_645_127, 353),
        ("qcdht0700", 98_684, 12),
        ("qcdht0700_2015", 211_212, 18),
        ("qcdht0700ext", 110_422, 13),
        ("qcdht0700ext_2015", 200_896, 16),
        ("qcdht1000", 55_762, 9),
        ("qcdht1000_2015", 61_176, 6),
        ("qcdht1000ext", 56_880, 8),
        ("qcdht1000ext_2015", 60_624, 6),
        ("qcdht1500", 52_785, 9),
        ("qcdht1500_2015", 49_775, 5),
        ("qcdht1500ext", 49_520, 8),
        ("qcdht1500ext_2015", 48_996, 4),
        ("qcdht2000", 44_922, 6),
        ("qcdht2000_2015", 53_304, 6),
        ("qcdht2000ext", 40_338, 6),
        ("qcdht2000ext_2015", 49_705, 5),
        ("ttbar", 399_372, 46),
        ("ttbar_2015", 919_380, 66),
    ]
    .into_iter()
    .fold(JobTypeTable::new(), |t, (name, events_per, files_per)| {
        t.explicit(name, events_per, files_per)
    })
});

const SIGNAL_TAUS: [&str; 5] = ["00100", "00300", "01000", "10000", "30000"];

/// Files per job for histogram and summary-tree production
pub static HISTOS: Lazy<JobTypeTable> = Lazy::new(|| {
    let mut table = JobTypeTable::new();

    for (name, files_per) in [
        ("JetHT2015C", 4),
        ("JetHT2015D", 200),
        ("qcdht0500_2015", 229),
        ("qcdht0500ext_2015", 269),
        ("qcdht0700_2015", 93),
        ("qcdht0700ext_2015", 141),
        ("qcdht1000_2015", 10),
        ("qcdht1000ext_2015", 15),
        ("qcdht1500_2015", 12),
        ("qcdht1500ext_2015", 12),
        ("qcdht2000_2015", 8),
        ("qcdht2000ext_2015", 10),
        ("ttbar_2015", 168),
        ("JetHT2016B3", 283),
        ("JetHT2016C", 228),
        ("JetHT2016D", 295),
        ("JetHT2016E", 270),
        ("JetHT2016F", 242),
        ("JetHT2016G", 219),
        ("JetHT2016H2", 344),
        ("JetHT2016H3", 63),
        ("my_mfv_neu_tau00300um_M0800", 100),
        ("qcdht0500", 229),
        ("qcdht0500ext", 269),
        ("qcdht0700", 93),
        ("qcdht0700ext", 141),
        ("qcdht1000", 10),
        ("qcdht1000ext", 15),
        ("qcdht1500", 12),
        ("qcdht1500ext", 12),
        ("qcdht2000", 8),
        ("qcdht2000ext", 10),
        ("ttbar", 168),
    ] {
        table.insert(name, TableEntry::Files { files_per });
    }

    // 2015 signal grid: one value for every point
    for tau in &SIGNAL_TAUS[..4] {
        for mass in ["0300", "0400", "0800", "1200", "1600"] {
            table.insert(
                format!("mfv_neu_tau{tau}um_M{mass}_2015"),
                TableEntry::Files { files_per: 2 },
            );
        }
    }

    for tau in SIGNAL_TAUS {
        for mass in ["0300", "0400", "0500", "0600", "0800", "1200", "1600"] {
            table.insert(
                format!("mfv_ddbar_tau{tau}um_M{mass}"),
                TableEntry::Files { files_per: 50 },
            );
        }
    }

    let neu_masses = ["0300", "0400", "0600", "0800", "1200", "1600", "3000"];
    let neu_files: [[u64; 7]; 5] = [
        [26, 54, 50, 7, 36, 8, 49],
        [1, 50, 100, 7, 27, 1, 49],
        [9, 48, 100, 4, 6, 1, 47],
        [12, 51, 50, 1, 4, 5, 48],
        [50, 50, 50, 50, 50, 50, 49],
    ];
    for (tau, row) in SIGNAL_TAUS.iter().zip(neu_files) {
        for (mass, files_per) in neu_masses.iter().zip(row) {
            table.insert(
                format!("mfv_neu_tau{tau}um_M{mass}"),
                TableEntry::Files { files_per },
            );
        }
    }

    table
});

/// Event rates and file fractions for ntuple production
pub static NTUPLE: Lazy<JobTypeTable> = Lazy::new(|| {
    [
        ("ttbar", 5.00e1, 5.76e-3),
        ("qcdht0500", 5.00e2, 6.03e-2),
        ("qcdht0700", 3.85e1, 4.54e-3),
        ("qcdht1000", 1.54e0, 2.42e-4),
        ("qcdht1500", 1.19e0, 2.03e-4),
        ("qcdht2000", 1.23e0, 1.65e-4),
        ("qcdht0500ext", 5.00e2, 6.10e-2),
        ("qcdht0700ext", 3.85e1, 4.53e-3),
        ("qcdht1000ext", 1.54e0, 2.16e-4),
        ("qcdht1500ext", 1.19e0, 1.92e-4),
        ("qcdht2000ext", 1.23e0, 1.84e-4),
        ("JetHT2015C", 1.75e1, 8.30e-4),
        ("JetHT2015D", 1.75e1, 7.65e-4),
        ("JetHT2016B3", 1.75e1, 1.05e-3),
        ("JetHT2016C", 1.61e1, 1.12e-3),
        ("JetHT2016D", 1.85e1, 1.27e-3),
        ("JetHT2016E", 1.37e1, 1.02e-3),
        ("JetHT2016F", 1.47e1, 1.23e-3),
        ("JetHT2016G", 1.10e1, 8.97e-4),
        ("JetHT2016H2", 1.11e1, 8.81e-4),
        ("JetHT2016H3", 1.11e1, 8.83e-4),
    ]
    .into_iter()
    .fold(JobTypeTable::new(), |t, (name, rate, frac)| {
        t.rate(name, rate, frac)
    })
});
