/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

// Found offline by random search over sparse candidates, using the fixed shift `64 - popcount(mask)`.

/// Magic multipliers for Rook occupancy hashing, one per square, A1 first.
const ROOK_MAGICS: [u64; 64] = [
    0x1080009080400A20, 0x0A40021000200044, 0x20800A2002100080, 0x4280100008008084,
    0x0E00040200081020, 0x0280010200800400, 0x0080020000800100, 0x0200002040840112,
    0x0A00800090204000, 0x0800804000200080, 0x1000802000801008, 0x2028801001080080,
    0x0C10800400808800, 0x0842802400800200, 0x0216005804420001, 0x2554800041000080,
    0x8D10208000400080, 0x1253030020400082, 0x2020848010042000, 0x0200828008001000,
    0x0004808008000402, 0x9228808004000200, 0x0240040008020110, 0x00C0020001006084,
    0x1110800080204000, 0x04C0400140201000, 0x0420008080100020, 0x0004230100100209,
    0x2302080280040080, 0x2082020080040080, 0x1005000100040200, 0x820AD04200208104,
    0x0000400080800020, 0x880040A001401000, 0x0020801000802000, 0x0100801000800801,
    0x0001800402800800, 0x0160400408012010, 0x010810020400A821, 0x0922004682000914,
    0x0080004420024000, 0x0040008020008040, 0x2402002040820011, 0x1004201042020008,
    0x0004000800808004, 0x4004040002008080, 0x0000020001008080, 0x0520040880420009,
    0x0000522085020200, 0x0090400906208100, 0xB000100020068480, 0x0480100180080280,
    0x280C818400080080, 0x6000200440100801, 0x0000814810020400, 0x4010004104288600,
    0x0140120100204082, 0x030A001100402086, 0x1000208040081202, 0x0003001000200409,
    0x020200201014882A, 0x4081000400080203, 0x0000410810009204, 0x0000008402C11026,
];

/// Magic multipliers for Bishop occupancy hashing, one per square, A1 first.
const BISHOP_MAGICS: [u64; 64] = [
    0x0210A00801002024, 0x0102340112160820, 0x0048020442081400, 0x0008061441100400,
    0x000C504030022020, 0x4025100894021063, 0x0200809088200222, 0x0402208050082008,
    0x20002020810A4084, 0x6185201841190030, 0x0304064802018005, 0x000018A082000000,
    0x0000951140200000, 0x0000008230410060, 0x4A040C011402E000, 0x0200150402010400,
    0x00400191044810A0, 0x0044101081080100, 0x0001000202020A02, 0x0060800802024602,
    0x02290008200801C1, 0x2002002820A42000, 0x0089000600902400, 0x0C00430096080900,
    0x0002100040B03210, 0x0008208044440080, 0x08624100080E1400, 0x20108020B2020200,
    0x0011010006104000, 0x0081020001008094, 0x1001010000580804, 0x000040800A10840A,
    0x41C220A200100208, 0x0100820820202800, 0x0082011000124080, 0x12004401080C0100,
    0x0184040400001010, 0x00E0008D000A8054, 0x0024080848020140, 0x8001010A04510044,
    0x0018140208422281, 0x4802091008802226, 0x004A020211028200, 0x0084004200802810,
    0x0475082208220400, 0x0201014101010200, 0x2004100200600202, 0x4002222600292200,
    0x0210421010080100, 0x0003024802180010, 0x0012808208160040, 0x0000006484041000,
    0x0820821042120080, 0x0108110230010000, 0x21041002C8010060, 0x4021440082024000,
    0x0B40148090086000, 0x0007060846421000, 0x1002000200443200, 0x0800010100420200,
    0x0800009A40050101, 0x0010401020010110, 0x0009840404080210, 0x1C08481002860018,
];
