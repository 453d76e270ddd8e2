use nxgrid_io::{read_chunked, read_whole, BlockingPlan, MemorySource, RawArray, ReadRequest};
use proptest::prelude::*;

fn ramp(dims: &[usize]) -> MemorySource {
    let n: usize = dims.iter().product();
    let data = (0..n).map(|i| i64::try_from(i).unwrap()).collect();
    MemorySource::new(dims.to_vec(), RawArray::Int64(data)).unwrap()
}

fn shapes() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(1usize..7, 1..=5)
}

proptest! {
    #[test]
    fn chunked_read_equals_whole_read(dims in shapes(), budget in 1usize..400) {
        let mut source = ramp(&dims);
        let chunked = read_chunked(&mut source, Some(budget)).unwrap();
        let whole = read_whole(&mut ramp(&dims)).unwrap();
        prop_assert_eq!(&chunked, &whole);
    }

    #[test]
    fn slabs_respect_budget_and_cover_array(dims in shapes(), budget in 1usize..400) {
        let total: usize = dims.iter().product();
        let last = *dims.last().unwrap();
        if let Some(plan) = BlockingPlan::for_budget(&dims, budget) {
            let bound = last.max(budget);
            let mut expected_offset = 0;
            for slab in plan.slabs() {
                prop_assert!(slab.len <= bound);
                prop_assert!(slab.len <= plan.buffer_len());
                prop_assert_eq!(slab.offset, expected_offset);
                expected_offset += slab.len;
            }
            prop_assert_eq!(expected_offset, total);
        } else {
            prop_assert!(total < last.max(budget));
        }
    }

    #[test]
    fn every_request_fits_the_buffer(dims in shapes(), budget in 1usize..400) {
        let mut source = ramp(&dims);
        read_chunked(&mut source, Some(budget)).unwrap();
        let bound = dims.last().unwrap().max(&budget);
        for request in source.requests() {
            if let ReadRequest::Slab { size, .. } = request {
                prop_assert!(size.iter().product::<usize>() <= *bound);
            }
        }
    }
}

#[test]
fn failing_store_returns_no_array() {
    let mut source = ramp(&[8, 8, 8]).with_failure_after(5);
    let result = read_chunked(&mut source, Some(64));
    assert!(matches!(result, Err(nxgrid_io::Error::Backend(_))));
}

#[test]
fn budget_disabled_reads_once() {
    let mut source = ramp(&[30, 30, 30]);
    read_chunked(&mut source, None).unwrap();
    assert_eq!(source.requests(), &[ReadRequest::Whole]);
}
