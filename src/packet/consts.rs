//
// Copyright (c) The Midst Core Contributors
//
// SPDX-License-Identifier: MIT
//

use num_derive::{FromPrimitive, ToPrimitive};

// TLV type codes.
//
// Values below 64 come from the core NDN packet format; the remaining codes
// are the registered routing-record types, including the MIDST extension
// block (142..=145).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(FromPrimitive, ToPrimitive)]
pub enum TlvType {
    // Core NDN packet format.
    Name = 7,
    GenericNameComponent = 8,
    SegmentNameComponent = 50,
    VersionNameComponent = 54,
    // Routing records.
    Lsa = 128,
    OriginRouter = 129,
    SequenceNumber = 130,
    AdjacencyLsa = 131,
    Adjacency = 132,
    CoordinateLsa = 133,
    HyperbolicRadius = 135,
    HyperbolicAngle = 136,
    NameLsa = 137,
    ExpirationTime = 139,
    Cost = 140,
    Uri = 141,
    // MIDST extension.
    MidstLsa = 142,
    MidstPrefixList = 143,
    Distance = 144,
    SeqNo = 145,
}
